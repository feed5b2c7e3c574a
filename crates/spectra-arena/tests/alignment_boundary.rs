//! Integration test: caller-supplied buffers at the alignment boundary.
//!
//! An exactly aligned start address forces the largest possible offset,
//! a full `alignment` bytes. A buffer of `payload + alignment - 1` bytes
//! must then be rejected and one of `payload + alignment` accepted.

use spectra_arena::{AlignedArrayComplex, AlignedArrayReal, NdArray};
use spectra_core::{Complex64, SpectraError};
use spectra_test_utils::AlignedWindow;

#[test]
fn one_byte_short_of_worst_case_fails() {
    for alignment in [16, 32, 64, 4096] {
        let payload = 4 * 6 * 16;
        let window = AlignedWindow::new(payload + alignment - 1, alignment);
        let err = AlignedArrayComplex::from_buffer(window, alignment, &[4, 6]).unwrap_err();
        assert_eq!(
            err,
            SpectraError::UndersizedBuffer {
                required: payload + alignment,
                available: payload + alignment - 1,
            },
            "alignment {alignment}"
        );
    }
}

#[test]
fn exactly_worst_case_succeeds() {
    for alignment in [16, 32, 64, 4096] {
        let payload = 4 * 6 * 16;
        let window = AlignedWindow::new(payload + alignment, alignment);
        let start = window.address();
        let view = AlignedArrayComplex::from_buffer(window, alignment, &[4, 6]).unwrap();
        let base = view.as_ptr().unwrap().as_ptr() as usize;
        assert_eq!(base, start + alignment);
        assert_eq!(base % alignment, 0);

        // The last element is addressable.
        view.set2(3, 5, Complex64::new(1.5, -1.5)).unwrap();
        assert_eq!(view.get_flat(23).unwrap(), Complex64::new(1.5, -1.5));
    }
}

#[test]
fn smaller_than_payload_fails_before_alignment() {
    let window = AlignedWindow::new(79, 8);
    let err = AlignedArrayReal::from_buffer(window, 8, &[10]).unwrap_err();
    assert_eq!(
        err,
        SpectraError::UndersizedBuffer {
            required: 80,
            available: 79,
        }
    );
}

#[test]
fn plain_vec_with_slack_always_fits() {
    for extra in 0..8 {
        let bytes = vec![0u8; 10 * 8 + 8 + extra];
        let view = AlignedArrayReal::from_buffer(bytes, 8, &[10]).unwrap();
        assert_eq!(view.len(), 10);
        assert_eq!(view.buffer_len(), 88 + extra);
    }
}
