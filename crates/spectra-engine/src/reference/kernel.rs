//! One-dimensional DFT kernels.
//!
//! Every kernel computes the unnormalised transform
//!
//! ```text
//! X[k] = sum_j x[j] * exp(sign * 2 pi i j k / n)
//! ```
//!
//! in place on a contiguous line, with `sign` taken from the direction.

use std::f64::consts::PI;
use std::fmt;

use spectra_core::{Complex64, Direction};

/// How a single axis is transformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Strategy {
    /// O(n^2) matrix product. Any length.
    Direct,
    /// Iterative Cooley-Tukey. Powers of two only.
    Radix2,
    /// Chirp-z via a power-of-two convolution. Any length.
    Bluestein,
}

impl Strategy {
    pub(crate) const ALL: [Strategy; 3] = [Strategy::Direct, Strategy::Radix2, Strategy::Bluestein];

    pub(crate) fn token(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Radix2 => "radix2",
            Self::Bluestein => "bluestein",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "direct" => Some(Self::Direct),
            "radix2" => Some(Self::Radix2),
            "bluestein" => Some(Self::Bluestein),
            _ => None,
        }
    }

    pub(crate) fn applies_to(self, n: usize) -> bool {
        match self {
            Self::Radix2 => n.is_power_of_two(),
            Self::Direct | Self::Bluestein => n >= 1,
        }
    }

    /// Heuristic choice used by estimate planning.
    pub(crate) fn estimate(n: usize) -> Self {
        if n.is_power_of_two() {
            Self::Radix2
        } else if n <= 16 {
            Self::Direct
        } else {
            Self::Bluestein
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Precomputed tables for one axis length, strategy, and direction.
pub(crate) struct Kernel {
    n: usize,
    strategy: Strategy,
    imp: Imp,
}

enum Imp {
    Direct { roots: Vec<Complex64> },
    Radix2(Radix2),
    Bluestein {
        chirp: Vec<Complex64>,
        filter: Vec<Complex64>,
        inner: Radix2,
    },
}

impl Kernel {
    /// Build a kernel, or `None` if `strategy` cannot handle `n`.
    pub(crate) fn new(n: usize, strategy: Strategy, direction: Direction) -> Option<Self> {
        if !strategy.applies_to(n) {
            return None;
        }
        let sign = direction.sign();
        let imp = match strategy {
            Strategy::Direct => Imp::Direct {
                roots: (0..n).map(|k| unit(sign * 2.0 * PI * k as f64 / n as f64)).collect(),
            },
            Strategy::Radix2 => Imp::Radix2(Radix2::new(n, sign)),
            Strategy::Bluestein => bluestein(n, sign),
        };
        Some(Self { n, strategy, imp })
    }

    pub(crate) fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub(crate) fn len(&self) -> usize {
        self.n
    }

    /// Transform `line` in place. `scratch` is reused between calls.
    pub(crate) fn apply(&self, line: &mut [Complex64], scratch: &mut Vec<Complex64>) {
        debug_assert_eq!(line.len(), self.n);
        match &self.imp {
            Imp::Direct { roots } => direct(roots, line, scratch),
            Imp::Radix2(r) => r.run(line),
            Imp::Bluestein {
                chirp,
                filter,
                inner,
            } => {
                let m = filter.len();
                scratch.clear();
                scratch.resize(m, Complex64::default());
                for (j, (&x, &w)) in line.iter().zip(chirp.iter()).enumerate() {
                    scratch[j] = x * w;
                }
                inner.run(scratch);
                for (a, &b) in scratch.iter_mut().zip(filter.iter()) {
                    *a *= b;
                }
                // Inverse via conjugation: ifft(x) = conj(fft(conj(x))).
                for a in scratch.iter_mut() {
                    *a = a.conj();
                }
                inner.run(scratch);
                let scale = 1.0 / m as f64;
                for (k, out) in line.iter_mut().enumerate() {
                    *out = scratch[k].conj() * scale * chirp[k];
                }
            }
        }
    }
}

fn unit(angle: f64) -> Complex64 {
    Complex64::new(angle.cos(), angle.sin())
}

fn direct(roots: &[Complex64], line: &mut [Complex64], scratch: &mut Vec<Complex64>) {
    let n = line.len();
    scratch.clear();
    scratch.extend_from_slice(line);
    for (k, out) in line.iter_mut().enumerate() {
        let mut acc = Complex64::default();
        let mut idx = 0usize;
        for &x in scratch.iter() {
            acc += x * roots[idx];
            idx += k;
            if idx >= n {
                idx -= n;
            }
        }
        *out = acc;
    }
}

struct Radix2 {
    twiddles: Vec<Complex64>,
    reversed: Vec<usize>,
}

impl Radix2 {
    fn new(n: usize, sign: f64) -> Self {
        let bits = n.trailing_zeros();
        let reversed = (0..n)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();
        let twiddles = (0..n / 2)
            .map(|k| unit(sign * 2.0 * PI * k as f64 / n as f64))
            .collect();
        Self { twiddles, reversed }
    }

    fn run(&self, line: &mut [Complex64]) {
        let n = line.len();
        for (i, &j) in self.reversed.iter().enumerate() {
            if i < j {
                line.swap(i, j);
            }
        }
        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let w = self.twiddles[k * step];
                    let a = line[start + k];
                    let b = line[start + k + half] * w;
                    line[start + k] = a + b;
                    line[start + k + half] = a - b;
                }
            }
            len <<= 1;
        }
    }
}

fn bluestein(n: usize, sign: f64) -> Imp {
    let m = (2 * n - 1).next_power_of_two();
    let two_n = 2 * n as u128;
    let chirp: Vec<Complex64> = (0..n)
        .map(|j| {
            let j2 = (j as u128 * j as u128) % two_n;
            unit(sign * PI * j2 as f64 / n as f64)
        })
        .collect();

    let mut filter = vec![Complex64::default(); m];
    filter[0] = chirp[0].conj();
    for j in 1..n {
        let c = chirp[j].conj();
        filter[j] = c;
        filter[m - j] = c;
    }
    let inner = Radix2::new(m, -1.0);
    inner.run(&mut filter);
    Imp::Bluestein {
        chirp,
        filter,
        inner,
    }
}
