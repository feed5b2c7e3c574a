//! Core types for the Spectra transform workspace.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by every other crate: array shapes and their
//! row-major offset arithmetic, the closed set of element kinds a view
//! may hold, transform direction and planner effort flags, and the
//! error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod element;
pub mod error;
pub mod flags;
pub mod shape;

pub use element::{Complex64, Element, ElementKind};
pub use error::{Resource, Result, ShapeError, SpectraError};
pub use flags::{Direction, Effort, PlannerFlags, TransformKind};
pub use shape::{Extents, Shape};
