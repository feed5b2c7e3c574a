//! Error types for the Spectra workspace.
//!
//! Every failure is local and synchronous: it is reported to the
//! immediate caller and never retried. The variants map one-to-one onto
//! the failure families of the array, pool, engine, and planning layers.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = SpectraError> = std::result::Result<T, E>;

/// The kind of resource an operation was attempted on after release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// An array view (aligned, pinned, or engine-allocated).
    View,
    /// A buffer checked out of a `BufferPool`.
    PooledBuffer,
    /// A transform plan.
    Plan,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "array view"),
            Self::PooledBuffer => write!(f, "pooled buffer"),
            Self::Plan => write!(f, "plan"),
        }
    }
}

/// Problems with an extent vector itself.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Rank must be at least one.
    #[error("shape has no dimensions")]
    Empty,
    /// Every extent must be positive.
    #[error("extent of axis {axis} is zero")]
    ZeroExtent {
        /// The offending axis.
        axis: usize,
    },
    /// The element count (or its byte size) does not fit in `usize`.
    #[error("shape {extents:?} overflows the addressable length")]
    Overflow {
        /// The extents that overflowed.
        extents: Vec<usize>,
    },
}

/// Errors raised by views, pools, plans, and the engine boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpectraError {
    /// The extent vector is invalid.
    #[error("invalid shape: {0}")]
    InvalidShape(#[from] ShapeError),

    /// An indexing call or plan binding used the wrong number of axes.
    #[error("dimension mismatch: rank is {expected}, got {actual} indices")]
    RankMismatch {
        /// Rank of the view.
        expected: usize,
        /// Number of indices supplied.
        actual: usize,
    },

    /// A per-axis index was not smaller than the axis extent.
    #[error("index {index} out of bounds for axis {axis} with extent {extent}")]
    IndexOutOfBounds {
        /// Axis being indexed.
        axis: usize,
        /// The supplied index.
        index: usize,
        /// Extent of that axis.
        extent: usize,
    },

    /// Two views that must agree in shape do not.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Required extents.
        expected: Vec<usize>,
        /// Extents of the supplied view.
        found: Vec<usize>,
    },

    /// A caller-supplied buffer cannot hold the requested shape.
    #[error("buffer too small: {required} bytes required, {available} available")]
    UndersizedBuffer {
        /// Bytes needed for the payload (after alignment when relevant).
        required: usize,
        /// Bytes the buffer actually provides.
        available: usize,
    },

    /// Alignment is zero, not a power of two, or weaker than the element needs.
    #[error("invalid alignment {alignment}")]
    InvalidAlignment {
        /// The rejected alignment in bytes.
        alignment: usize,
    },

    /// The resource was released and can no longer be used.
    #[error("{resource} has been released")]
    Disposed {
        /// What was released.
        resource: Resource,
    },

    /// A copy range exceeds the bounds of a view.
    #[error("range {offset}..{offset}+{count} exceeds length {len}")]
    OutOfRange {
        /// Starting element offset.
        offset: usize,
        /// Number of elements.
        count: usize,
        /// Length of the view the range was checked against.
        len: usize,
    },

    /// The transform engine could not be located or initialised.
    #[error("transform engine unavailable: {reason}")]
    EngineUnavailable {
        /// Why initialisation failed.
        reason: String,
    },

    /// The engine rejected a wisdom string as ill-formed.
    #[error("malformed wisdom")]
    MalformedWisdom,

    /// The engine allocator returned no memory.
    #[error("engine allocation of {bytes} bytes failed")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
    },

    /// The plan never materialised (wisdom-only planning found no wisdom).
    #[error("plan was not materialised and cannot be executed")]
    PlanNotMaterialized,
}

impl SpectraError {
    /// Shorthand for a [`SpectraError::Disposed`] error.
    pub fn disposed(resource: Resource) -> Self {
        Self::Disposed { resource }
    }
}
