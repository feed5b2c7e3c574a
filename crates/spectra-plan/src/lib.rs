//! Transform plans and the wisdom-first acquisition protocol.
//!
//! [`Plan`] binds an engine plan to an input and an output view and can
//! be executed any number of times. [`PlanAcquirer`] runs one-shot
//! transforms: it prefers plans that need no copies (estimate, or
//! wisdom-only), and otherwise plans on scratch memory so a measuring
//! planner never sees the caller's input.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod acquire;
pub mod config;
pub mod plan;

pub use acquire::{AcquisitionPath, PlanAcquirer};
pub use config::{worker_count, ConfigError, PlannerConfig};
pub use plan::Plan;
