//! The process-wide runtime singleton.
//!
//! The first call to [`global`] initialises the [`ReferenceEngine`]
//! unless [`install`] supplied a different engine earlier. The outcome,
//! success or failure, is fixed for the life of the process: if
//! initialisation failed, every later call fails fast with the same
//! `EngineUnavailable` error.

use std::sync::{Arc, OnceLock};

use spectra_core::SpectraError;
use thiserror::Error;

use crate::engine::Engine;
use crate::reference::ReferenceEngine;
use crate::runtime::Runtime;

static RUNTIME: OnceLock<Result<Arc<Runtime>, SpectraError>> = OnceLock::new();

/// Errors from [`install`].
#[derive(Debug, Error)]
pub enum InstallError {
    /// A runtime was already initialised, by `install` or by first use.
    #[error("a transform runtime is already installed")]
    AlreadyInstalled,
    /// The supplied engine failed to initialise. The failure is now the
    /// process-wide outcome.
    #[error(transparent)]
    Unavailable(#[from] SpectraError),
}

/// The process-wide runtime, initialising it on first use.
pub fn global() -> Result<Arc<Runtime>, SpectraError> {
    RUNTIME
        .get_or_init(|| Runtime::new(Box::new(ReferenceEngine::new())))
        .clone()
}

/// Install `engine` as the process-wide engine.
///
/// Must be called before anything touches [`global`].
pub fn install(engine: Box<dyn Engine>) -> Result<Arc<Runtime>, InstallError> {
    let mut installed_here = false;
    let outcome = RUNTIME.get_or_init(|| {
        installed_here = true;
        Runtime::new(engine)
    });
    if !installed_here {
        return Err(InstallError::AlreadyInstalled);
    }
    Ok(outcome.clone()?)
}

/// Whether the process-wide runtime has been initialised (successfully
/// or not).
pub fn is_initialised() -> bool {
    RUNTIME.get().is_some()
}
