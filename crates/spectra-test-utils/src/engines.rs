//! Mock engines.
//!
//! - [`FailingEngine`]: initialisation always fails.
//! - [`RecordingEngine`]: a [`ReferenceEngine`] that logs every plan
//!   build, execution, and destruction, and can be told to refuse
//!   builds.

#![allow(unsafe_code)]

use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use spectra_core::{Direction, PlannerFlags, TransformKind};
use spectra_engine::{Engine, PlanHandle, PlanRequest, ReferenceEngine};

// ── FailingEngine ───────────────────────────────────────────────

/// An engine whose `initialize` fails with a fixed reason.
pub struct FailingEngine {
    pub reason: String,
}

impl FailingEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Engine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn initialize(&self) -> Result<(), String> {
        Err(self.reason.clone())
    }

    fn allocate(&self, _bytes: usize) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn free(&self, _ptr: NonNull<u8>, _bytes: usize) {}

    fn configure_worker_count(&self, _workers: usize) {}

    unsafe fn build_plan(&self, _request: &PlanRequest<'_>) -> Option<PlanHandle> {
        None
    }

    unsafe fn execute(&self, _plan: PlanHandle) {}

    fn destroy_plan(&self, _plan: PlanHandle) {}

    fn export_wisdom(&self, _sink: &mut dyn FnMut(u8)) {}

    fn import_wisdom(&self, _text: &str) -> bool {
        false
    }

    fn export_wisdom_to_file(&self, _path: &Path) -> bool {
        false
    }

    fn import_wisdom_from_file(&self, _path: &Path) -> bool {
        false
    }

    fn forget_wisdom(&self) {}
}

// ── RecordingEngine ─────────────────────────────────────────────

/// One `build_plan` call as the engine saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineCall {
    pub kind: TransformKind,
    pub direction: Direction,
    pub extents: Vec<usize>,
    pub input: usize,
    pub output: usize,
    pub flags: PlannerFlags,
    pub workers: usize,
    pub built: bool,
}

#[derive(Default)]
struct Log {
    builds: Vec<EngineCall>,
    executed: usize,
    destroyed: usize,
    workers: usize,
}

/// Shared view of a [`RecordingEngine`]'s log, usable after the engine
/// has been moved into a runtime.
#[derive(Clone, Default)]
pub struct CallLog {
    log: Arc<Mutex<Log>>,
    refuse_builds: Arc<AtomicBool>,
}

impl CallLog {
    /// Every `build_plan` call so far, oldest first.
    pub fn builds(&self) -> Vec<EngineCall> {
        self.log.lock().builds.clone()
    }

    pub fn executed(&self) -> usize {
        self.log.lock().executed
    }

    pub fn destroyed(&self) -> usize {
        self.log.lock().destroyed
    }

    pub fn clear(&self) {
        *self.log.lock() = Log::default();
    }

    /// Make every build that is neither estimate nor wisdom-only return
    /// `None`.
    pub fn refuse_measured_builds(&self, refuse: bool) {
        self.refuse_builds.store(refuse, Ordering::SeqCst);
    }
}

/// A [`ReferenceEngine`] that records what it is asked to do.
pub struct RecordingEngine {
    inner: ReferenceEngine,
    log: CallLog,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::wrapping(ReferenceEngine::new())
    }

    pub fn wrapping(inner: ReferenceEngine) -> Self {
        Self {
            inner,
            log: CallLog::default(),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn initialize(&self) -> Result<(), String> {
        self.inner.initialize()
    }

    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        self.inner.allocate(bytes)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        // SAFETY: forwarded to the caller.
        unsafe { self.inner.free(ptr, bytes) }
    }

    fn configure_worker_count(&self, workers: usize) {
        self.log.log.lock().workers = workers;
        self.inner.configure_worker_count(workers);
    }

    unsafe fn build_plan(&self, request: &PlanRequest<'_>) -> Option<PlanHandle> {
        let measured = !request.flags.contains(PlannerFlags::ESTIMATE) && !request.flags.wisdom_only();
        let plan = if measured && self.log.refuse_builds.load(Ordering::SeqCst) {
            None
        } else {
            // SAFETY: forwarded to the caller.
            unsafe { self.inner.build_plan(request) }
        };
        let mut log = self.log.log.lock();
        let workers = log.workers;
        log.builds.push(EngineCall {
            kind: request.kind,
            direction: request.direction,
            extents: request.extents.to_vec(),
            input: request.input.as_ptr() as usize,
            output: request.output.as_ptr() as usize,
            flags: request.flags,
            workers,
            built: plan.is_some(),
        });
        plan
    }

    unsafe fn execute(&self, plan: PlanHandle) {
        self.log.log.lock().executed += 1;
        // SAFETY: forwarded to the caller.
        unsafe { self.inner.execute(plan) }
    }

    fn destroy_plan(&self, plan: PlanHandle) {
        self.log.log.lock().destroyed += 1;
        self.inner.destroy_plan(plan);
    }

    fn export_wisdom(&self, sink: &mut dyn FnMut(u8)) {
        self.inner.export_wisdom(sink);
    }

    fn import_wisdom(&self, text: &str) -> bool {
        self.inner.import_wisdom(text)
    }

    fn export_wisdom_to_file(&self, path: &Path) -> bool {
        self.inner.export_wisdom_to_file(path)
    }

    fn import_wisdom_from_file(&self, path: &Path) -> bool {
        self.inner.import_wisdom_from_file(path)
    }

    fn forget_wisdom(&self) {
        self.inner.forget_wisdom();
    }
}
