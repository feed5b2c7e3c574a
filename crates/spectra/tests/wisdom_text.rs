//! Integration test: wisdom as text and as files on the process-wide
//! runtime.
//!
//! Every test here changes the global wisdom, so they take a shared lock
//! and run one at a time.

use parking_lot::{const_mutex, Mutex};
use spectra::engine::global;
use spectra::prelude::*;
use spectra::wisdom;

static SERIAL: Mutex<()> = const_mutex(());

fn learn(n: usize) {
    let input = AlignedArrayComplex::new(16, &[n]).unwrap();
    let output = AlignedArrayComplex::new(16, &[n]).unwrap();
    spectra::fft(&input, &output, PlannerFlags::MEASURE, 1).unwrap();
}

fn covered(n: usize) -> bool {
    let runtime = global().unwrap();
    let data = AlignedArrayComplex::new(16, &[n]).unwrap();
    let plan = Plan::dft(&runtime, &data, &data, Direction::Forward, PlannerFlags::WISDOM_ONLY, 1).unwrap();
    plan.is_executable()
}

#[test]
fn text_round_trip() {
    let _serial = SERIAL.lock();
    wisdom::clear().unwrap();
    learn(40);
    let saved = wisdom::current().unwrap();
    assert!(saved.starts_with("(spectra-wisdom-"));
    assert!(saved.contains("(c2c forward measure (40)"));

    wisdom::clear().unwrap();
    assert!(!covered(40));
    wisdom::set_current(&saved).unwrap();
    assert!(covered(40));
    assert_eq!(wisdom::current().unwrap(), saved);
}

#[test]
fn malformed_text_is_rejected_and_changes_nothing() {
    let _serial = SERIAL.lock();
    wisdom::clear().unwrap();
    learn(24);
    let before = wisdom::current().unwrap();

    assert_eq!(
        wisdom::set_current("(not wisdom at all)"),
        Err(SpectraError::MalformedWisdom)
    );
    assert_eq!(wisdom::current().unwrap(), before);
}

#[test]
fn empty_text_forgets_everything() {
    let _serial = SERIAL.lock();
    learn(18);
    assert!(covered(18));
    wisdom::set_current("").unwrap();
    assert!(!covered(18));
    assert!(!wisdom::current().unwrap().contains("measure"));
}

#[test]
fn file_round_trip() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wisdom.txt");

    wisdom::clear().unwrap();
    learn(30);
    assert!(wisdom::export(&path).unwrap());
    let saved = wisdom::current().unwrap();

    wisdom::clear().unwrap();
    assert!(!covered(30));
    assert!(wisdom::import(&path).unwrap());
    assert!(covered(30));
    assert_eq!(wisdom::current().unwrap(), saved);

    assert!(!wisdom::import(dir.path().join("missing.txt")).unwrap());
}
