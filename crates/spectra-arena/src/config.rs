//! Buffer pool configuration parameters.

use thiserror::Error;

/// Configuration for a [`BufferPool`](crate::BufferPool).
///
/// Validated by [`BufferPool::with_config`](crate::BufferPool::with_config).
/// The pooling threshold can be changed later; the retention budget is
/// fixed for the life of the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Requests and returns smaller than this many bytes bypass the pool.
    ///
    /// Default: 85_000. Small buffers are cheap to allocate and would
    /// only crowd the bucket list.
    pub min_size_to_pool: usize,

    /// Upper bound on the bytes held in the cache at any time.
    ///
    /// Default: 256 MiB. When a return would exceed the budget, the
    /// oldest cached buffers are reclaimed first. Zero disables
    /// retention entirely.
    pub max_retained_bytes: usize,
}

impl PoolConfig {
    /// Default pooling threshold in bytes.
    pub const DEFAULT_MIN_SIZE_TO_POOL: usize = 85_000;

    /// Default retention budget in bytes.
    pub const DEFAULT_MAX_RETAINED_BYTES: usize = 256 * 1024 * 1024;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retained_bytes != 0 && self.max_retained_bytes < self.min_size_to_pool {
            return Err(ConfigError::RetentionBelowThreshold {
                max_retained_bytes: self.max_retained_bytes,
                min_size_to_pool: self.min_size_to_pool,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size_to_pool: Self::DEFAULT_MIN_SIZE_TO_POOL,
            max_retained_bytes: Self::DEFAULT_MAX_RETAINED_BYTES,
        }
    }
}

/// Errors detected by [`PoolConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A non-zero budget smaller than the threshold could never hold a
    /// single poolable buffer.
    #[error(
        "retention budget of {max_retained_bytes} bytes is below the pooling threshold of {min_size_to_pool} bytes"
    )]
    RetentionBelowThreshold {
        /// The configured budget.
        max_retained_bytes: usize,
        /// The configured threshold.
        min_size_to_pool: usize,
    },
}
