//! Integration test: reference engine output against a naive DFT for
//! every transform kind, including odd lengths that take the Bluestein
//! path.

use std::ptr::NonNull;

use spectra_core::{Complex64, Direction, PlannerFlags, TransformKind};
use spectra_engine::{PlanRequest, ReferenceEngine, Runtime};
use spectra_test_utils::max_abs_diff;

fn naive(x: &[Complex64], direction: Direction) -> Vec<Complex64> {
    let n = x.len();
    (0..n)
        .map(|k| {
            x.iter()
                .enumerate()
                .map(|(j, &v)| {
                    let angle = direction.sign() * 2.0 * std::f64::consts::PI * (j * k) as f64 / n as f64;
                    v * Complex64::new(angle.cos(), angle.sin())
                })
                .sum::<Complex64>()
        })
        .collect()
}

fn run(runtime: &Runtime, request: &PlanRequest<'_>) {
    let session = runtime.session();
    // SAFETY: callers size both buffers for the request's layout.
    let plan = unsafe { session.build_plan(2, request) }.unwrap();
    drop(session);
    // SAFETY: as above; the buffers outlive the call.
    unsafe { runtime.execute(plan) };
    runtime.session().destroy_plan(plan);
}

fn signal(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.9).cos()).collect()
}

#[test]
fn complex_matches_naive() {
    let runtime = Runtime::new(Box::new(ReferenceEngine::new())).unwrap();
    for n in [1, 2, 7, 16, 45, 97, 128] {
        for direction in [Direction::Forward, Direction::Backward] {
            let input: Vec<Complex64> = signal(n)
                .into_iter()
                .zip(signal(n + 3).into_iter().skip(3))
                .map(|(re, im)| Complex64::new(re, im))
                .collect();
            let mut a = input.clone();
            let mut b = vec![Complex64::default(); n];
            let request = PlanRequest {
                kind: TransformKind::ComplexToComplex,
                direction,
                extents: &[n],
                input: NonNull::from(a.as_mut_slice()).cast(),
                output: NonNull::from(b.as_mut_slice()).cast(),
                flags: PlannerFlags::ESTIMATE,
            };
            run(&runtime, &request);
            assert!(max_abs_diff(&b, &naive(&input, direction)) < 1e-8, "n={n} {direction}");
        }
    }
}

#[test]
fn real_to_complex_is_the_half_spectrum() {
    let runtime = Runtime::new(Box::new(ReferenceEngine::new())).unwrap();
    for n in [1, 6, 97, 100] {
        let mut real = signal(n);
        let full = naive(
            &real.iter().map(|&re| Complex64::new(re, 0.0)).collect::<Vec<_>>(),
            Direction::Forward,
        );
        let mut half = vec![Complex64::default(); n / 2 + 1];
        let request = PlanRequest {
            kind: TransformKind::RealToComplex,
            direction: Direction::Forward,
            extents: &[n],
            input: NonNull::from(real.as_mut_slice()).cast(),
            output: NonNull::from(half.as_mut_slice()).cast(),
            flags: PlannerFlags::ESTIMATE,
        };
        run(&runtime, &request);
        assert!(max_abs_diff(&half, &full[..n / 2 + 1]) < 1e-8, "n={n}");
    }
}

#[test]
fn complex_to_real_inverts_real_to_complex() {
    let runtime = Runtime::new(Box::new(ReferenceEngine::new())).unwrap();
    for extents in [vec![9], vec![4, 6], vec![3, 5, 7]] {
        let n: usize = extents.iter().product();
        let last = extents[extents.len() - 1];
        let half_len = n / last * (last / 2 + 1);
        let original = signal(n);
        let mut real = original.clone();
        let mut half = vec![Complex64::default(); half_len];
        let mut back = vec![0.0; n];

        let forward = PlanRequest {
            kind: TransformKind::RealToComplex,
            direction: Direction::Forward,
            extents: &extents,
            input: NonNull::from(real.as_mut_slice()).cast(),
            output: NonNull::from(half.as_mut_slice()).cast(),
            flags: PlannerFlags::ESTIMATE,
        };
        run(&runtime, &forward);
        let backward = PlanRequest {
            kind: TransformKind::ComplexToReal,
            direction: Direction::Backward,
            extents: &extents,
            input: NonNull::from(half.as_mut_slice()).cast(),
            output: NonNull::from(back.as_mut_slice()).cast(),
            flags: PlannerFlags::ESTIMATE,
        };
        run(&runtime, &backward);

        for (b, o) in back.iter().zip(&original) {
            assert!((b / n as f64 - o).abs() < 1e-9, "extents {extents:?}");
        }
    }
}
