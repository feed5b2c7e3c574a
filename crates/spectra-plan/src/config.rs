//! Planner configuration and worker-count resolution.

use std::num::NonZeroUsize;

use spectra_arena::PoolConfig;
use thiserror::Error;

/// Configuration for a [`PlanAcquirer`](crate::PlanAcquirer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Byte alignment of pooled scratch views. Must be a power of two of
    /// at least 16.
    ///
    /// Default: 16.
    pub alignment: usize,

    /// Configuration of the scratch buffer pool.
    pub pool: PoolConfig,
}

impl PlannerConfig {
    /// Default scratch alignment in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() || self.alignment < Self::DEFAULT_ALIGNMENT {
            return Err(ConfigError::InvalidAlignment {
                alignment: self.alignment,
            });
        }
        self.pool.validate()?;
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            alignment: Self::DEFAULT_ALIGNMENT,
            pool: PoolConfig::default(),
        }
    }
}

/// Errors detected by [`PlannerConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Scratch alignment is not a power of two, or is below 16 bytes.
    #[error("scratch alignment {alignment} must be a power of two of at least 16")]
    InvalidAlignment {
        /// The configured alignment.
        alignment: usize,
    },
    /// The pool configuration is invalid.
    #[error(transparent)]
    Pool(#[from] spectra_arena::ConfigError),
}

/// Resolve a worker-count hint: positive values are taken as is, zero
/// and negative values mean every available processing unit.
pub fn worker_count(hint: i32) -> usize {
    match usize::try_from(hint) {
        Ok(n) if n > 0 => n,
        _ => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
    }
}
