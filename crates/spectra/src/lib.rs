//! Spectra: aligned n-dimensional array views and wisdom-first DFT
//! planning.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Spectra sub-crates. For most users, adding `spectra` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spectra::prelude::*;
//!
//! let n = 64;
//! let input = AlignedArrayComplex::new(16, &[n]).unwrap();
//! for i in 0..n {
//!     input.set1(i, Complex64::new((i as f64).sin(), 0.0)).unwrap();
//! }
//! let spectrum = AlignedArrayComplex::new(16, &[n]).unwrap();
//! let restored = AlignedArrayComplex::new(16, &[n]).unwrap();
//!
//! spectra::fft(&input, &spectrum, PlannerFlags::ESTIMATE, 1).unwrap();
//! spectra::ifft(&spectrum, &restored, PlannerFlags::ESTIMATE, 1).unwrap();
//!
//! // Transforms are unnormalised: a round trip scales by n.
//! let x = input.get1(5).unwrap();
//! let y = restored.get1(5).unwrap() / n as f64;
//! assert!((x - y).norm() < 1e-9);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `spectra-core` | Shapes, element kinds, planner flags, errors |
//! | [`arena`] | `spectra-arena` | Array views, copies, the buffer pool |
//! | [`engine`] | `spectra-engine` | Engine boundary, runtime, reference engine |
//! | [`plan`] | `spectra-plan` | Plans and the acquisition protocol |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dft;
pub mod wisdom;

pub use dft::{complex_extents, fft, ifft, irfft, rfft, Dft};

/// Shapes, element kinds, planner flags, and errors (`spectra-core`).
pub use spectra_core as types;

/// Array views, raw copies, and the scratch buffer pool
/// (`spectra-arena`).
///
/// [`arena::AlignedArray`], [`arena::PinnedArray`], and
/// [`arena::EngineArray`] all implement [`arena::NdArray`].
pub use spectra_arena as arena;

/// The engine call boundary and the process-wide runtime
/// (`spectra-engine`).
///
/// Call [`engine::install`] before any transform to use an engine other
/// than [`engine::ReferenceEngine`].
pub use spectra_engine as engine;

/// Plans bound to views and the acquisition protocol (`spectra-plan`).
pub use spectra_plan as plan;

/// Common imports for typical Spectra usage.
///
/// ```rust
/// use spectra::prelude::*;
/// ```
pub mod prelude {
    // Views
    pub use spectra_arena::{
        copy_all, copy_to, AlignedArray, AlignedArrayComplex, AlignedArrayReal, BufferPool,
        EngineArrayComplex, EngineArrayReal, NdArray, PinnedArray,
    };

    // Core types
    pub use spectra_core::{Complex64, Direction, PlannerFlags, Shape, SpectraError};

    // Planning
    pub use spectra_plan::{AcquisitionPath, Plan, PlanAcquirer, PlannerConfig};

    // Entry points
    pub use crate::dft::Dft;
}
