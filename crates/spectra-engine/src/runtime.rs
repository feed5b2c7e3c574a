//! An initialised engine plus the process-wide planning lock.

use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use parking_lot::{const_reentrant_mutex, ReentrantMutex, ReentrantMutexGuard};
use spectra_arena::NativeAllocator;
use spectra_core::SpectraError;
use tracing::{info, warn};

use crate::engine::{Engine, PlanHandle, PlanRequest};

/// Serialises plan construction, plan destruction, and wisdom access
/// across every runtime in the process.
static PLANNING_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Marker that precedes the version in a wisdom header.
const VERSION_MARKER: &[u8] = b"-wisdom-";

/// An engine that initialised successfully, with its probed version.
pub struct Runtime {
    engine: Box<dyn Engine>,
    version: String,
}

impl Runtime {
    /// Initialise `engine` and probe its version.
    ///
    /// The version is read from the wisdom header: the token following
    /// `-wisdom-` in the streamed export.
    pub fn new(engine: Box<dyn Engine>) -> Result<Arc<Self>, SpectraError> {
        engine
            .initialize()
            .map_err(|reason| SpectraError::EngineUnavailable { reason })?;
        let version = {
            let _guard = PLANNING_LOCK.lock();
            probe_version(engine.as_ref())
        };
        let version = version.unwrap_or_else(|| "unknown".to_string());
        info!(engine = engine.name(), %version, "transform engine initialised");
        Ok(Arc::new(Self { engine, version }))
    }

    /// Name reported by the engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Version probed at initialisation.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Acquire the planning lock.
    ///
    /// Blocks until no other thread in the process is planning or
    /// touching wisdom. Planning calls may take seconds; there is no
    /// timeout.
    ///
    /// The lock is reentrant: a thread holding a session may open another
    /// one, or drop a plan (whose release destroys it under the lock),
    /// without blocking on itself. Sessions are not `Send`.
    pub fn session(&self) -> PlanningSession<'_> {
        PlanningSession {
            _guard: PLANNING_LOCK.lock(),
            engine: self.engine.as_ref(),
        }
    }

    /// Run a plan. Does not take the planning lock.
    ///
    /// # Safety
    ///
    /// See [`Engine::execute`].
    pub unsafe fn execute(&self, plan: PlanHandle) {
        // SAFETY: forwarded to the caller.
        unsafe { self.engine.execute(plan) }
    }

    /// Materialise the current wisdom as text.
    pub fn wisdom(&self) -> String {
        self.session().export_wisdom()
    }
}

impl NativeAllocator for Runtime {
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        self.engine.allocate(bytes)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, bytes: usize) {
        // SAFETY: forwarded to the caller.
        unsafe { self.engine.free(ptr, bytes) }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("engine", &self.engine.name())
            .field("version", &self.version)
            .finish()
    }
}

/// Proof that the planning lock is held.
///
/// Every engine call that is unsafe to run concurrently is only
/// reachable through a session. Dropping the session releases the lock.
pub struct PlanningSession<'a> {
    _guard: ReentrantMutexGuard<'static, ()>,
    engine: &'a dyn Engine,
}

impl PlanningSession<'_> {
    /// Configure the worker count, then build a plan.
    ///
    /// # Safety
    ///
    /// See [`Engine::build_plan`].
    pub unsafe fn build_plan(&self, workers: usize, request: &PlanRequest<'_>) -> Option<PlanHandle> {
        self.engine.configure_worker_count(workers);
        // SAFETY: forwarded to the caller.
        unsafe { self.engine.build_plan(request) }
    }

    /// Destroy a plan.
    pub fn destroy_plan(&self, plan: PlanHandle) {
        self.engine.destroy_plan(plan);
    }

    /// Stream the current wisdom into a string.
    pub fn export_wisdom(&self) -> String {
        let mut bytes = Vec::new();
        self.engine.export_wisdom(&mut |b| bytes.push(b));
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Merge wisdom from text.
    pub fn import_wisdom(&self, text: &str) -> bool {
        let accepted = self.engine.import_wisdom(text);
        if !accepted {
            warn!(len = text.len(), "engine rejected wisdom text");
        }
        accepted
    }

    /// Write the current wisdom to `path`.
    pub fn export_wisdom_to_file(&self, path: &Path) -> bool {
        self.engine.export_wisdom_to_file(path)
    }

    /// Merge wisdom from `path`.
    pub fn import_wisdom_from_file(&self, path: &Path) -> bool {
        let accepted = self.engine.import_wisdom_from_file(path);
        if !accepted {
            warn!(path = %path.display(), "engine rejected wisdom file");
        }
        accepted
    }

    /// Discard all wisdom.
    pub fn forget_wisdom(&self) {
        self.engine.forget_wisdom();
    }
}

/// Stream the export and collect the bytes between the version marker
/// and the next whitespace. Stops collecting as soon as it is done.
fn probe_version(engine: &dyn Engine) -> Option<String> {
    let mut matched = 0usize;
    let mut done = false;
    let mut version = Vec::new();
    engine.export_wisdom(&mut |b| {
        if done {
            return;
        }
        if matched == VERSION_MARKER.len() {
            if b.is_ascii_whitespace() || b == b')' {
                done = true;
            } else {
                version.push(b);
            }
        } else if b == VERSION_MARKER[matched] {
            matched += 1;
        } else {
            matched = usize::from(b == VERSION_MARKER[0]);
        }
    });
    if version.is_empty() {
        return None;
    }
    String::from_utf8(version).ok()
}
