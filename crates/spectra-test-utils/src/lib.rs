//! Test fixtures and mock engines for Spectra development.
//!
//! - signal generators ([`sine_wave`], [`complex_sine`], [`ramp`]);
//! - [`AlignedWindow`], raw storage whose start address is exactly
//!   aligned, which forces the worst-case alignment offset;
//! - engines for exercising the runtime and planning layers
//!   ([`FailingEngine`], [`RecordingEngine`]).

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod engines;
pub mod storage;

pub use engines::{CallLog, EngineCall, FailingEngine, RecordingEngine};
pub use storage::AlignedWindow;

use spectra_core::Complex64;

/// `cycles` periods of a unit sine over `n` samples, phase-shifted so no
/// sample is exactly zero.
pub fn sine_wave(n: usize, cycles: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * cycles * (i as f64 + 0.25) / n as f64).sin())
        .collect()
}

/// [`sine_wave`] as the real part of complex samples.
pub fn complex_sine(n: usize, cycles: f64) -> Vec<Complex64> {
    sine_wave(n, cycles)
        .into_iter()
        .map(|re| Complex64::new(re, 0.0))
        .collect()
}

/// `0, 1, 2, ...` as reals.
pub fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

/// Largest absolute difference between two complex sequences.
pub fn max_abs_diff(a: &[Complex64], b: &[Complex64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_has_no_zero_samples() {
        let wave = sine_wave(2048, 8.0);
        assert_eq!(wave.len(), 2048);
        assert!(wave.iter().all(|v| v.abs() > 1e-6));
    }
}
