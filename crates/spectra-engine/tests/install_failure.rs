//! Integration test: a process whose engine fails to initialise.
//!
//! The failure is sticky: every later use of the global runtime fails
//! fast with the same error. Kept in its own test binary because the
//! global runtime is per process.

use spectra_core::SpectraError;
use spectra_engine::{global, install, is_initialised, InstallError, ReferenceEngine};
use spectra_test_utils::FailingEngine;

#[test]
fn failed_install_is_sticky() {
    assert!(!is_initialised());
    let err = install(Box::new(FailingEngine::new("no native library"))).unwrap_err();
    assert!(matches!(
        err,
        InstallError::Unavailable(SpectraError::EngineUnavailable { .. })
    ));
    assert!(is_initialised());

    for _ in 0..3 {
        assert_eq!(
            global().unwrap_err(),
            SpectraError::EngineUnavailable {
                reason: "no native library".to_string(),
            }
        );
    }
    assert!(matches!(
        install(Box::new(ReferenceEngine::new())),
        Err(InstallError::AlreadyInstalled)
    ));
}
