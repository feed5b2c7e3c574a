//! Benchmark profiles for the Spectra transform workspace.
//!
//! - [`acquirer`]: a plan acquirer on a private reference runtime
//! - [`filled_complex`]: an aligned complex view holding a test signal
//! - [`TRANSFORM_SIZES`]: lengths covering every reference strategy

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use spectra_arena::{AlignedArrayComplex, NdArray};
use spectra_core::{Complex64, SpectraError};
use spectra_engine::{ReferenceEngine, Runtime};
use spectra_plan::PlanAcquirer;

/// Small, power-of-two, and prime lengths: direct, radix-2, and
/// Bluestein respectively under estimate planning.
pub const TRANSFORM_SIZES: [usize; 4] = [12, 1024, 4096, 1009];

/// A plan acquirer with default settings on a fresh reference runtime,
/// so benchmarks never share wisdom with each other.
pub fn acquirer() -> Result<PlanAcquirer, SpectraError> {
    let runtime = Runtime::new(Box::new(ReferenceEngine::new()))?;
    Ok(PlanAcquirer::with_defaults(runtime))
}

/// An aligned complex view of `extents` holding a deterministic signal.
pub fn filled_complex(extents: &[usize]) -> Result<AlignedArrayComplex, SpectraError> {
    let view = AlignedArrayComplex::new(16, extents)?;
    for i in 0..view.len() {
        let t = i as f64 * 0.013;
        view.set_flat(i, Complex64::new(t.sin(), (3.0 * t).cos()))?;
    }
    Ok(view)
}
