//! Integration test: transform properties over arbitrary lengths.

use proptest::prelude::*;
use spectra::engine::{ReferenceEngine, Runtime};
use spectra::prelude::*;

fn dft() -> Dft {
    let runtime = Runtime::new(Box::new(ReferenceEngine::new())).unwrap();
    Dft::with_runtime(runtime)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn complex_round_trip_scales_by_length(
        values in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 1..96),
    ) {
        let n = values.len();
        let dft = dft();
        let input = AlignedArrayComplex::new(16, &[n]).unwrap();
        for (i, &(re, im)) in values.iter().enumerate() {
            input.set1(i, Complex64::new(re, im)).unwrap();
        }
        let spectrum = AlignedArrayComplex::new(16, &[n]).unwrap();
        let restored = AlignedArrayComplex::new(16, &[n]).unwrap();

        dft.forward(&input, &spectrum, PlannerFlags::ESTIMATE, 1).unwrap();
        dft.backward(&spectrum, &restored, PlannerFlags::ESTIMATE, 1).unwrap();

        for i in 0..n {
            let x = input.get1(i).unwrap();
            let y = restored.get1(i).unwrap() / n as f64;
            prop_assert!((x - y).norm() < 1e-8 * n as f64);
        }
    }

    #[test]
    fn real_dc_bin_is_the_sum(values in prop::collection::vec(-5.0f64..5.0, 1..80)) {
        let n = values.len();
        let dft = dft();
        let input = AlignedArrayReal::new(16, &[n]).unwrap();
        input.fill_from(&values).unwrap();
        let extents = spectra::complex_extents(&[n]).unwrap();
        prop_assert_eq!(extents[0], n / 2 + 1);
        let spectrum = AlignedArrayComplex::new(16, &extents).unwrap();

        dft.forward_real(&input, &spectrum, PlannerFlags::ESTIMATE, 1).unwrap();

        let sum: f64 = values.iter().sum();
        let dc = spectrum.get1(0).unwrap();
        prop_assert!((dc.re - sum).abs() < 1e-8 * n as f64);
        prop_assert!(dc.im.abs() < 1e-8 * n as f64);
        prop_assert_eq!(input.to_vec().unwrap(), values);
    }
}
