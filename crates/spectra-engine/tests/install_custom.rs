//! Integration test: installing a custom engine before first use.

use std::sync::Arc;

use spectra_engine::{global, install, InstallError, ReferenceEngine};
use spectra_test_utils::RecordingEngine;

#[test]
fn install_then_global_returns_the_same_runtime() {
    let installed = install(Box::new(RecordingEngine::new())).unwrap();
    assert_eq!(installed.engine_name(), "recording");

    let runtime = global().unwrap();
    assert!(Arc::ptr_eq(&installed, &runtime));

    assert!(matches!(
        install(Box::new(ReferenceEngine::new())),
        Err(InstallError::AlreadyInstalled)
    ));
}
