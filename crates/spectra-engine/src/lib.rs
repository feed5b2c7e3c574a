//! Transform engine boundary for Spectra.
//!
//! The [`Engine`] trait is the thin call layer to whatever computes the
//! transforms: allocation, plan construction and execution, and wisdom
//! persistence. A [`Runtime`] wraps an initialised engine and owns the
//! one thing engines cannot do for themselves: serialising planning.
//!
//! ```text
//!            ┌──────────── PLANNING_LOCK (process-wide) ───────────┐
//! Runtime ──►│ configure_worker_count → build_plan                  │
//!            │ destroy_plan                                         │
//!            │ export / import / forget wisdom                      │
//!            └──────────────────────────────────────────────────────┘
//! Runtime ──► execute, allocate, free          (no lock)
//! ```
//!
//! The process-wide runtime is reached through [`global`]; it uses the
//! built-in [`ReferenceEngine`] unless [`install`] chose another engine
//! first.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod engine;
pub mod global;
pub mod reference;
pub mod runtime;

pub use engine::{Engine, PlanHandle, PlanRequest};
pub use global::{global, install, is_initialised, InstallError};
pub use reference::ReferenceEngine;
pub use runtime::{PlanningSession, Runtime};
