//! One-shot transforms.
//!
//! Every entry point derives the direction and element types from its
//! name and takes rank and extents from the views. The worker hint is
//! an `i32`: zero or negative means every available processing unit.

use std::sync::{Arc, OnceLock};

use spectra_arena::NdArray;
use spectra_core::{Complex64, Direction, PlannerFlags, Shape, SpectraError};
use spectra_engine::Runtime;
use spectra_plan::{worker_count, AcquisitionPath, ConfigError, PlanAcquirer, PlannerConfig};

/// Transform entry points bound to one runtime and one scratch pool.
#[derive(Clone, Debug)]
pub struct Dft {
    acquirer: PlanAcquirer,
}

impl Dft {
    /// Transforms on the process-wide runtime with default settings.
    ///
    /// Fails with `EngineUnavailable` if the engine could not be
    /// initialised.
    pub fn new() -> Result<Self, SpectraError> {
        Ok(Self::with_runtime(spectra_engine::global()?))
    }

    /// Transforms on `runtime` with default settings.
    pub fn with_runtime(runtime: Arc<Runtime>) -> Self {
        Self {
            acquirer: PlanAcquirer::with_defaults(runtime),
        }
    }

    /// Transforms on `runtime` with a validated configuration.
    pub fn with_config(runtime: Arc<Runtime>, config: PlannerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            acquirer: PlanAcquirer::new(runtime, config)?,
        })
    }

    /// The underlying acquirer, for access to the runtime and the pool.
    pub fn acquirer(&self) -> &PlanAcquirer {
        &self.acquirer
    }

    /// Forward complex transform. `input` and `output` may be the same
    /// view.
    pub fn forward(
        &self,
        input: &dyn NdArray<Complex64>,
        output: &dyn NdArray<Complex64>,
        flags: PlannerFlags,
        workers: i32,
    ) -> Result<AcquisitionPath, SpectraError> {
        self.acquirer
            .dft(input, output, Direction::Forward, flags, worker_count(workers))
    }

    /// Backward (unnormalised inverse) complex transform.
    pub fn backward(
        &self,
        input: &dyn NdArray<Complex64>,
        output: &dyn NdArray<Complex64>,
        flags: PlannerFlags,
        workers: i32,
    ) -> Result<AcquisitionPath, SpectraError> {
        self.acquirer
            .dft(input, output, Direction::Backward, flags, worker_count(workers))
    }

    /// Forward real-to-complex transform into the half spectrum.
    pub fn forward_real(
        &self,
        input: &dyn NdArray<f64>,
        output: &dyn NdArray<Complex64>,
        flags: PlannerFlags,
        workers: i32,
    ) -> Result<AcquisitionPath, SpectraError> {
        self.acquirer
            .rfft(input, output, flags, worker_count(workers))
    }

    /// Backward complex-to-real transform from the half spectrum.
    pub fn backward_real(
        &self,
        input: &dyn NdArray<Complex64>,
        output: &dyn NdArray<f64>,
        flags: PlannerFlags,
        workers: i32,
    ) -> Result<AcquisitionPath, SpectraError> {
        self.acquirer
            .irfft(input, output, flags, worker_count(workers))
    }
}

static SHARED: OnceLock<Dft> = OnceLock::new();

fn shared() -> Result<&'static Dft, SpectraError> {
    let runtime = spectra_engine::global()?;
    Ok(SHARED.get_or_init(|| Dft::with_runtime(runtime)))
}

/// Forward complex transform on the process-wide runtime.
pub fn fft(
    input: &dyn NdArray<Complex64>,
    output: &dyn NdArray<Complex64>,
    flags: PlannerFlags,
    workers: i32,
) -> Result<AcquisitionPath, SpectraError> {
    shared()?.forward(input, output, flags, workers)
}

/// Backward complex transform on the process-wide runtime.
pub fn ifft(
    input: &dyn NdArray<Complex64>,
    output: &dyn NdArray<Complex64>,
    flags: PlannerFlags,
    workers: i32,
) -> Result<AcquisitionPath, SpectraError> {
    shared()?.backward(input, output, flags, workers)
}

/// Forward real-to-complex transform on the process-wide runtime.
pub fn rfft(
    input: &dyn NdArray<f64>,
    output: &dyn NdArray<Complex64>,
    flags: PlannerFlags,
    workers: i32,
) -> Result<AcquisitionPath, SpectraError> {
    shared()?.forward_real(input, output, flags, workers)
}

/// Backward complex-to-real transform on the process-wide runtime.
pub fn irfft(
    input: &dyn NdArray<Complex64>,
    output: &dyn NdArray<f64>,
    flags: PlannerFlags,
    workers: i32,
) -> Result<AcquisitionPath, SpectraError> {
    shared()?.backward_real(input, output, flags, workers)
}

/// Extents of the half spectrum of a real transform: the last extent
/// `n` becomes `n / 2 + 1`.
pub fn complex_extents(real: &[usize]) -> Result<Vec<usize>, SpectraError> {
    Ok(Shape::new(real)?.complex_extents().extents().to_vec())
}
