//! The wisdom-first plan acquisition protocol.
//!
//! Measuring plans overwrite the buffers they are planned against, so
//! they are never built against the caller's input. Each transform
//! walks the paths below in order and stops at the first that applies:
//!
//! ```text
//! estimate requested ─────────────► plan on caller views, execute         Estimate
//! wisdom-only plan on caller views
//!   └─ materialized ──────────────► execute                               Wisdom
//! c2c, input and output distinct ─► plan on (output, output),
//!                                   copy input → output, execute          OutputScratch
//! otherwise ──────────────────────► pooled aligned scratch, plan on it,
//!                                   copy in, execute, copy out if needed  PooledScratch
//! ```
//!
//! Real transforms have no output-scratch path: the input and output
//! element types differ, so the input side always gets pooled scratch.
//! A caller that asks for wisdom-only planning never reaches the
//! measuring paths.

use std::fmt;
use std::sync::Arc;

use spectra_arena::{copy_all, copy_to, AlignedArray, BufferPool, NdArray};
use spectra_core::{Complex64, Direction, Element, PlannerFlags, SpectraError};
use spectra_engine::Runtime;
use tracing::debug;

use crate::config::{ConfigError, PlannerConfig};
use crate::plan::{same_memory, Plan};

/// The path a transform took through the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquisitionPath {
    /// Estimate planning directly on the caller's views.
    Estimate,
    /// A wisdom-only plan on the caller's views. No copies, no scratch.
    Wisdom,
    /// Measured on the caller's output, which then received the input.
    OutputScratch,
    /// Measured on a pooled scratch view.
    PooledScratch,
}

impl fmt::Display for AcquisitionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Estimate => "estimate",
            Self::Wisdom => "wisdom",
            Self::OutputScratch => "output-scratch",
            Self::PooledScratch => "pooled-scratch",
        })
    }
}

/// Acquires and runs plans for one runtime, with a scratch pool.
///
/// Cloning is cheap: clones share the runtime and the pool.
#[derive(Clone, Debug)]
pub struct PlanAcquirer {
    runtime: Arc<Runtime>,
    pool: BufferPool,
    alignment: usize,
}

impl PlanAcquirer {
    /// An acquirer with a fresh pool built from `config`.
    pub fn new(runtime: Arc<Runtime>, config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pool = BufferPool::with_config(config.pool)?;
        Ok(Self {
            runtime,
            pool,
            alignment: config.alignment,
        })
    }

    /// An acquirer with a default pool and 16-byte scratch alignment.
    pub fn with_defaults(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            pool: BufferPool::new(),
            alignment: PlannerConfig::DEFAULT_ALIGNMENT,
        }
    }

    /// An acquirer drawing scratch from an existing pool.
    pub fn with_pool(runtime: Arc<Runtime>, pool: BufferPool, alignment: usize) -> Result<Self, ConfigError> {
        PlannerConfig {
            alignment,
            ..PlannerConfig::default()
        }
        .validate()?;
        Ok(Self {
            runtime,
            pool,
            alignment,
        })
    }

    /// The runtime plans are built on.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// The scratch pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Scratch alignment in bytes.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Complex transform of `input` into `output`, which may be the same
    /// view. Rank and extents come from `input`.
    pub fn dft(
        &self,
        input: &dyn NdArray<Complex64>,
        output: &dyn NdArray<Complex64>,
        direction: Direction,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<AcquisitionPath, SpectraError> {
        let rt = &self.runtime;
        let path = if let Some(path) = self.try_direct(flags, |flags| {
            Plan::dft(rt, input, output, direction, flags, workers)
        })? {
            path
        } else if !same_memory(input, output)? {
            let plan = Plan::dft_with_shape(rt, output, output, input.extents(), direction, flags, workers)?;
            copy_all(input, output)?;
            plan.execute()?;
            AcquisitionPath::OutputScratch
        } else {
            let scratch = self.scratch::<Complex64>(input.extents())?;
            let plan = Plan::dft(rt, &scratch, &scratch, direction, flags, workers)?;
            copy_all(input, &scratch)?;
            plan.execute()?;
            copy_to(&scratch, output, 0, 0, input.len())?;
            AcquisitionPath::PooledScratch
        };
        self.log(path, input.extents(), direction);
        Ok(path)
    }

    /// Forward real-to-complex transform. `output` must have the complex
    /// extents of `input`.
    pub fn rfft(
        &self,
        input: &dyn NdArray<f64>,
        output: &dyn NdArray<Complex64>,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<AcquisitionPath, SpectraError> {
        let rt = &self.runtime;
        let path = match self.try_direct(flags, |flags| Plan::r2c(rt, input, output, flags, workers))? {
            Some(path) => path,
            None => {
                let scratch = self.scratch::<f64>(input.extents())?;
                let plan = Plan::r2c(rt, &scratch, output, flags, workers)?;
                copy_all(input, &scratch)?;
                plan.execute()?;
                AcquisitionPath::PooledScratch
            }
        };
        self.log(path, input.extents(), Direction::Forward);
        Ok(path)
    }

    /// Backward complex-to-real transform. `input` must have the complex
    /// extents of `output`; rank and logical extents come from `output`.
    pub fn irfft(
        &self,
        input: &dyn NdArray<Complex64>,
        output: &dyn NdArray<f64>,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<AcquisitionPath, SpectraError> {
        let rt = &self.runtime;
        let path = match self.try_direct(flags, |flags| Plan::c2r(rt, input, output, flags, workers))? {
            Some(path) => path,
            None => {
                let scratch = self.scratch::<Complex64>(input.extents())?;
                let plan = Plan::c2r(rt, &scratch, output, flags, workers)?;
                copy_all(input, &scratch)?;
                plan.execute()?;
                AcquisitionPath::PooledScratch
            }
        };
        self.log(path, output.extents(), Direction::Backward);
        Ok(path)
    }

    /// The two paths that plan on the caller's views: estimate, then a
    /// wisdom-only attempt. `None` means a measuring path is needed.
    fn try_direct<'v, I, O, F>(&self, flags: PlannerFlags, build: F) -> Result<Option<AcquisitionPath>, SpectraError>
    where
        I: Element,
        O: Element,
        F: Fn(PlannerFlags) -> Result<Plan<'v, I, O>, SpectraError>,
    {
        if flags.contains(PlannerFlags::ESTIMATE) {
            build(flags - PlannerFlags::WISDOM_ONLY)?.execute()?;
            return Ok(Some(AcquisitionPath::Estimate));
        }
        let plan = build(flags | PlannerFlags::WISDOM_ONLY)?;
        if plan.is_executable() {
            plan.execute()?;
            return Ok(Some(AcquisitionPath::Wisdom));
        }
        if flags.wisdom_only() {
            return Err(SpectraError::PlanNotMaterialized);
        }
        Ok(None)
    }

    fn scratch<T: Element>(&self, extents: &[usize]) -> Result<AlignedArray<T>, SpectraError> {
        AlignedArray::from_pool(&self.pool, self.alignment, extents)
    }

    fn log(&self, path: AcquisitionPath, extents: &[usize], direction: Direction) {
        debug!(
            %path,
            rank = extents.len(),
            ?extents,
            %direction,
            engine = self.runtime.engine_name(),
            "transform executed"
        );
    }
}
