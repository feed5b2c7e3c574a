//! The call boundary to a transform engine.
//!
//! An [`Engine`] owns the transform mathematics, the plan representation,
//! and the wisdom store. The rest of the workspace only ever talks to it
//! through a [`Runtime`](crate::Runtime), which serialises every planning
//! and wisdom call behind the process-wide planning lock.

use std::fmt;
use std::path::Path;
use std::ptr::NonNull;

use spectra_core::{Direction, PlannerFlags, TransformKind};

/// Opaque identifier of a plan built by an [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanHandle(pub u64);

impl fmt::Display for PlanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan#{:x}", self.0)
    }
}

/// Everything an engine needs to build a plan.
///
/// `extents` are the logical (real-side) extents of the problem. Element
/// layout of the two buffers follows from `kind`:
///
/// | kind  | input                         | output                        |
/// |-------|-------------------------------|-------------------------------|
/// | `c2c` | `Complex64`, `extents`        | `Complex64`, `extents`        |
/// | `r2c` | `f64`, `extents`              | `Complex64`, complex extents  |
/// | `c2r` | `Complex64`, complex extents  | `f64`, `extents`              |
///
/// where the complex extents replace the last extent `n` by `n / 2 + 1`.
#[derive(Clone, Copy, Debug)]
pub struct PlanRequest<'a> {
    /// Element-type combination.
    pub kind: TransformKind,
    /// Exponent sign.
    pub direction: Direction,
    /// Logical extents, outermost first.
    pub extents: &'a [usize],
    /// Base address of the input buffer.
    pub input: NonNull<u8>,
    /// Base address of the output buffer; may equal `input`.
    pub output: NonNull<u8>,
    /// Planning effort and wisdom-only mode.
    pub flags: PlannerFlags,
}

/// A transform engine.
///
/// Engines are not expected to be thread-safe for planning: the
/// [`Runtime`](crate::Runtime) calls [`configure_worker_count`],
/// [`build_plan`], [`destroy_plan`], and every wisdom method only while
/// holding the process-wide planning lock. [`execute`] and the allocator
/// methods are called without it and must tolerate concurrent use.
///
/// [`configure_worker_count`]: Engine::configure_worker_count
/// [`build_plan`]: Engine::build_plan
/// [`destroy_plan`]: Engine::destroy_plan
/// [`execute`]: Engine::execute
pub trait Engine: Send + Sync {
    /// Short engine name used in logs and wisdom headers.
    fn name(&self) -> &str;

    /// Prepare the engine for use. Called once, before anything else.
    ///
    /// An error here makes every entry point fail with
    /// `EngineUnavailable`.
    fn initialize(&self) -> Result<(), String>;

    /// Allocate `bytes` bytes of engine memory.
    fn allocate(&self, bytes: usize) -> Option<NonNull<u8>>;

    /// Free memory from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate(bytes)` on this engine and must not
    /// be used afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>, bytes: usize);

    /// Set the worker count used by plans built from now on.
    fn configure_worker_count(&self, workers: usize);

    /// Build a plan, or return `None`.
    ///
    /// `None` is the expected answer to a wisdom-only request that no
    /// wisdom covers. Unless the flags request estimation or wisdom-only
    /// planning, the engine may overwrite both buffers.
    ///
    /// # Safety
    ///
    /// Both buffers must be valid for the layout described on
    /// [`PlanRequest`] for the duration of the call.
    unsafe fn build_plan(&self, request: &PlanRequest<'_>) -> Option<PlanHandle>;

    /// Run a plan on the buffers it was built against.
    ///
    /// # Safety
    ///
    /// `plan` must be live, and the buffers it was built against must
    /// still be valid and not accessed by anything else during the call.
    unsafe fn execute(&self, plan: PlanHandle);

    /// Destroy a plan. Unknown handles are ignored.
    fn destroy_plan(&self, plan: PlanHandle);

    /// Stream the current wisdom as text, one byte at a time.
    fn export_wisdom(&self, sink: &mut dyn FnMut(u8));

    /// Merge wisdom from text. Returns `false` if the text is rejected.
    fn import_wisdom(&self, text: &str) -> bool;

    /// Write the current wisdom to a file.
    fn export_wisdom_to_file(&self, path: &Path) -> bool;

    /// Merge wisdom from a file.
    fn import_wisdom_from_file(&self, path: &Path) -> bool;

    /// Discard all accumulated wisdom.
    fn forget_wisdom(&self);
}
