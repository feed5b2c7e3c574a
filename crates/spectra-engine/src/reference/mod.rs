//! A software transform engine.
//!
//! [`ReferenceEngine`] implements the whole [`Engine`] contract in plain
//! Rust so the planning layer can run, and be tested, without a native
//! library. It mirrors the observable behaviour of a native engine:
//!
//! - estimate planning picks a strategy per axis heuristically and never
//!   touches the buffers;
//! - measure, patient, and exhaustive planning fill the plan's buffers
//!   with a test signal and time candidate strategies on them, leaving
//!   both buffers overwritten; the winners are recorded as wisdom;
//! - wisdom-only planning returns a plan only if wisdom at the requested
//!   effort or higher exists, and never touches the buffers.

mod kernel;
mod plan;
mod wisdom;

use std::collections::HashMap;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use spectra_core::{Complex64, Direction, Effort, TransformKind};
use tracing::{debug, trace};

use crate::engine::{Engine, PlanHandle, PlanRequest};

use self::kernel::{Kernel, Strategy};
use self::plan::{BufferAddr, CompiledPlan};
use self::wisdom::{WisdomEntry, WisdomKey, WisdomStore};

/// Alignment of memory handed out by [`Engine::allocate`].
pub const ALLOCATION_ALIGNMENT: usize = 64;

/// The built-in software engine.
pub struct ReferenceEngine {
    version: String,
    workers: AtomicUsize,
    next_plan: AtomicU64,
    plans: RwLock<HashMap<u64, Arc<CompiledPlan>>>,
    wisdom: Mutex<WisdomStore>,
}

impl ReferenceEngine {
    /// A fresh engine with no wisdom. Its version is the crate version.
    pub fn new() -> Self {
        Self::with_version(env!("CARGO_PKG_VERSION"))
    }

    /// A fresh engine reporting `version` in its wisdom header.
    pub fn with_version(version: &str) -> Self {
        Self {
            version: version.to_string(),
            workers: AtomicUsize::new(1),
            next_plan: AtomicU64::new(1),
            plans: RwLock::new(HashMap::new()),
            wisdom: Mutex::new(WisdomStore::default()),
        }
    }

    /// Number of live plans.
    pub fn live_plans(&self) -> usize {
        self.plans.read().len()
    }

    fn choose_strategies(&self, request: &PlanRequest<'_>, key: &WisdomKey) -> Option<SmallVec<[Strategy; 4]>> {
        let effort = request.flags.effort();
        let known = self
            .wisdom
            .lock()
            .lookup(key, effort)
            .map(|e| e.strategies.clone());
        if request.flags.wisdom_only() {
            return known;
        }
        if let Some(strategies) = known {
            return Some(strategies);
        }
        if effort == Effort::Estimate {
            return Some(request.extents.iter().map(|&n| Strategy::estimate(n)).collect());
        }

        // SAFETY: `build_plan`'s contract makes both buffers valid.
        unsafe { fill_test_signal(request) };
        let strategies: SmallVec<[Strategy; 4]> = request
            .extents
            .iter()
            .map(|&n| measure_axis(n, key.direction, effort, request))
            .collect();
        self.wisdom.lock().record(
            key.clone(),
            WisdomEntry {
                effort,
                strategies: strategies.clone(),
            },
        );
        Some(strategies)
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ReferenceEngine {
    fn name(&self) -> &str {
        "spectra-reference"
    }

    fn initialize(&self) -> Result<(), String> {
        Ok(())
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        let layout = std::alloc::Layout::from_size_align(bytes.max(1), ALLOCATION_ALIGNMENT).ok()?;
        // SAFETY: the layout has non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        if let Ok(layout) = std::alloc::Layout::from_size_align(bytes.max(1), ALLOCATION_ALIGNMENT) {
            // SAFETY: the caller guarantees `ptr` came from `allocate(bytes)`,
            // which used this exact layout.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    fn configure_worker_count(&self, workers: usize) {
        self.workers.store(workers.max(1), Ordering::Relaxed);
    }

    unsafe fn build_plan(&self, request: &PlanRequest<'_>) -> Option<PlanHandle> {
        if request.extents.is_empty() || request.extents.contains(&0) {
            return None;
        }
        let direction = match request.kind {
            TransformKind::ComplexToComplex => request.direction,
            TransformKind::RealToComplex => Direction::Forward,
            TransformKind::ComplexToReal => Direction::Backward,
        };
        let key = WisdomKey {
            kind: request.kind,
            direction,
            extents: SmallVec::from_slice(request.extents),
        };
        let strategies = self.choose_strategies(request, &key)?;
        let kernels = request
            .extents
            .iter()
            .zip(strategies.iter())
            .map(|(&n, &s)| Kernel::new(n, s, direction))
            .collect::<Option<Vec<_>>>()?;

        let compiled = CompiledPlan {
            kind: request.kind,
            extents: key.extents.clone(),
            input: BufferAddr::new(request.input),
            output: BufferAddr::new(request.output),
            kernels,
            workers: self.workers.load(Ordering::Relaxed),
        };
        let id = self.next_plan.fetch_add(1, Ordering::Relaxed);
        self.plans.write().insert(id, Arc::new(compiled));
        debug!(
            plan = id,
            kind = %request.kind,
            extents = ?request.extents,
            strategies = ?strategies.iter().map(|s| s.token()).collect::<Vec<_>>(),
            "reference plan built"
        );
        Some(PlanHandle(id))
    }

    unsafe fn execute(&self, plan: PlanHandle) {
        let compiled = self.plans.read().get(&plan.0).cloned();
        match compiled {
            // SAFETY: forwarded to the caller.
            Some(compiled) => unsafe { compiled.execute() },
            None => trace!(%plan, "execute on unknown plan ignored"),
        }
    }

    fn destroy_plan(&self, plan: PlanHandle) {
        self.plans.write().remove(&plan.0);
    }

    fn export_wisdom(&self, sink: &mut dyn FnMut(u8)) {
        let text = self.wisdom.lock().to_text(&self.version);
        text.bytes().for_each(sink);
    }

    fn import_wisdom(&self, text: &str) -> bool {
        self.wisdom.lock().merge_text(text)
    }

    fn export_wisdom_to_file(&self, path: &Path) -> bool {
        let text = self.wisdom.lock().to_text(&self.version);
        std::fs::write(path, text).is_ok()
    }

    fn import_wisdom_from_file(&self, path: &Path) -> bool {
        match std::fs::read_to_string(path) {
            Ok(text) => self.import_wisdom(&text),
            Err(_) => false,
        }
    }

    fn forget_wisdom(&self) {
        self.wisdom.lock().clear();
    }
}

/// Candidates tried, and timing repetitions, at each effort.
fn candidates(n: usize, effort: Effort) -> (SmallVec<[Strategy; 3]>, u32) {
    let direct_limit = match effort {
        Effort::Estimate | Effort::Measure => 64,
        Effort::Patient => 512,
        Effort::Exhaustive => usize::MAX,
    };
    let reps = match effort {
        Effort::Estimate | Effort::Measure => 1,
        Effort::Patient => 3,
        Effort::Exhaustive => 5,
    };
    let list = Strategy::ALL
        .into_iter()
        .filter(|s| s.applies_to(n))
        .filter(|s| *s != Strategy::Direct || n <= direct_limit)
        .collect();
    (list, reps)
}

/// Time every candidate on one line taken from the output buffer and
/// write each result back over it.
fn measure_axis(n: usize, direction: Direction, effort: Effort, request: &PlanRequest<'_>) -> Strategy {
    let (list, reps) = candidates(n, effort);
    let mut best = (Strategy::estimate(n), Duration::MAX);
    let mut line: Vec<Complex64> = (0..n).map(|i| Complex64::new(i as f64, -(i as f64))).collect();
    let mut scratch = Vec::new();
    for strategy in list {
        let Some(kernel) = Kernel::new(n, strategy, direction) else {
            continue;
        };
        let mut fastest = Duration::MAX;
        for _ in 0..reps {
            let start = Instant::now();
            kernel.apply(&mut line, &mut scratch);
            fastest = fastest.min(start.elapsed());
        }
        // SAFETY: `build_plan`'s contract makes the output valid.
        unsafe { scribble_output(request, &line) };
        if fastest < best.1 {
            best = (strategy, fastest);
        }
    }
    best.0
}

/// Element counts of the input and output buffers.
fn buffer_lens(request: &PlanRequest<'_>) -> (usize, usize) {
    let n: usize = request.extents.iter().product();
    let last = request.extents[request.extents.len() - 1];
    let half = n / last * (last / 2 + 1);
    match request.kind {
        TransformKind::ComplexToComplex => (n, n),
        TransformKind::RealToComplex => (n, half),
        TransformKind::ComplexToReal => (half, n),
    }
}

/// Overwrite the input with a deterministic test signal.
///
/// # Safety
///
/// The input buffer must be valid for the request's layout.
unsafe fn fill_test_signal(request: &PlanRequest<'_>) {
    let (input_len, _) = buffer_lens(request);
    let base = request.input.as_ptr();
    for i in 0..input_len {
        let v = (i as f64 * 0.731).sin();
        // SAFETY: `i < input_len`.
        unsafe {
            match request.kind {
                TransformKind::RealToComplex => base.cast::<f64>().add(i).write(v),
                _ => base.cast::<Complex64>().add(i).write(Complex64::new(v, 1.0 - v)),
            }
        }
    }
}

/// Copy a measurement result over the start of the output buffer.
///
/// # Safety
///
/// The output buffer must be valid for the request's layout.
unsafe fn scribble_output(request: &PlanRequest<'_>, line: &[Complex64]) {
    let (_, output_len) = buffer_lens(request);
    let base = request.output.as_ptr();
    for (i, c) in line.iter().take(output_len).enumerate() {
        // SAFETY: `i < output_len`.
        unsafe {
            match request.kind {
                TransformKind::ComplexToReal => base.cast::<f64>().add(i).write(c.re),
                _ => base.cast::<Complex64>().add(i).write(*c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_core::PlannerFlags;

    fn c2c_request<'a>(
        extents: &'a [usize],
        input: &mut [Complex64],
        output: &mut [Complex64],
        flags: PlannerFlags,
    ) -> PlanRequest<'a> {
        PlanRequest {
            kind: TransformKind::ComplexToComplex,
            direction: Direction::Forward,
            extents,
            input: NonNull::from(input).cast(),
            output: NonNull::from(output).cast(),
            flags,
        }
    }

    #[test]
    fn estimate_leaves_buffers_alone() {
        let engine = ReferenceEngine::new();
        let mut input = vec![Complex64::new(1.0, 2.0); 12];
        let mut output = vec![Complex64::new(3.0, 4.0); 12];
        let request = c2c_request(&[12], &mut input, &mut output, PlannerFlags::ESTIMATE);
        let plan = unsafe { engine.build_plan(&request) }.unwrap();
        assert!(input.iter().all(|&c| c == Complex64::new(1.0, 2.0)));
        assert!(output.iter().all(|&c| c == Complex64::new(3.0, 4.0)));
        engine.destroy_plan(plan);
        assert_eq!(engine.live_plans(), 0);
    }

    #[test]
    fn measure_scribbles_and_records_wisdom() {
        let engine = ReferenceEngine::new();
        let mut input = vec![Complex64::new(1.0, 2.0); 16];
        let mut output = vec![Complex64::new(3.0, 4.0); 16];
        let request = c2c_request(&[16], &mut input, &mut output, PlannerFlags::MEASURE);
        let plan = unsafe { engine.build_plan(&request) }.unwrap();
        assert!(input.iter().any(|&c| c != Complex64::new(1.0, 2.0)));
        assert!(output.iter().any(|&c| c != Complex64::new(3.0, 4.0)));
        assert_eq!(engine.wisdom.lock().len(), 1);
        engine.destroy_plan(plan);
    }

    #[test]
    fn wisdom_only_needs_matching_wisdom() {
        let engine = ReferenceEngine::new();
        let mut a = vec![Complex64::default(); 8];
        let mut b = vec![Complex64::default(); 8];
        let only = PlannerFlags::WISDOM_ONLY;
        let request = c2c_request(&[8], &mut a, &mut b, only);
        assert!(unsafe { engine.build_plan(&request) }.is_none());

        let request = c2c_request(&[8], &mut a, &mut b, PlannerFlags::MEASURE);
        unsafe { engine.build_plan(&request) }.unwrap();

        let request = c2c_request(&[8], &mut a, &mut b, only);
        assert!(unsafe { engine.build_plan(&request) }.is_some());
        let request = c2c_request(&[8], &mut a, &mut b, only | PlannerFlags::PATIENT);
        assert!(unsafe { engine.build_plan(&request) }.is_none());
    }

    #[test]
    fn wisdom_only_does_not_touch_buffers() {
        let engine = ReferenceEngine::new();
        let mut a = vec![Complex64::new(5.0, 0.0); 4];
        let mut b = vec![Complex64::new(6.0, 0.0); 4];
        let request = c2c_request(&[4], &mut a, &mut b, PlannerFlags::WISDOM_ONLY);
        assert!(unsafe { engine.build_plan(&request) }.is_none());
        assert!(a.iter().all(|&c| c == Complex64::new(5.0, 0.0)));
        assert!(b.iter().all(|&c| c == Complex64::new(6.0, 0.0)));
    }

    #[test]
    fn execute_transforms_captured_buffers() {
        let engine = ReferenceEngine::new();
        let mut input = vec![Complex64::default(); 4];
        let mut output = vec![Complex64::default(); 4];
        let request = c2c_request(&[4], &mut input, &mut output, PlannerFlags::ESTIMATE);
        let plan = unsafe { engine.build_plan(&request) }.unwrap();
        input[0] = Complex64::new(1.0, 0.0);
        unsafe { engine.execute(plan) };
        assert!(output.iter().all(|&c| (c - Complex64::new(1.0, 0.0)).norm() < 1e-12));
    }

    #[test]
    fn allocation_is_aligned() {
        let engine = ReferenceEngine::new();
        let ptr = engine.allocate(100).unwrap();
        assert_eq!(ptr.as_ptr() as usize % ALLOCATION_ALIGNMENT, 0);
        unsafe { engine.free(ptr, 100) };
    }

    #[test]
    fn candidate_sets_grow_with_effort() {
        assert_eq!(candidates(128, Effort::Measure).0.len(), 2);
        assert_eq!(candidates(128, Effort::Patient).0.len(), 3);
        assert_eq!(candidates(1000, Effort::Patient).0.as_slice(), &[Strategy::Bluestein]);
        assert_eq!(candidates(1000, Effort::Exhaustive).0.len(), 2);
    }
}
