//! Compiled plans and their execution.
//!
//! A multi-dimensional transform is a sequence of one-dimensional passes,
//! one per axis. For axis `a` the buffer splits into contiguous blocks of
//! `extent[a] * stride[a]` elements; each block holds `stride[a]`
//! interleaved lines. Blocks are independent, which is what the worker
//! split runs on.

use std::ptr::NonNull;

use smallvec::SmallVec;
use spectra_core::{Complex64, TransformKind};

use super::kernel::Kernel;

/// Below this many elements a pass always runs on the calling thread.
const PARALLEL_MIN_LEN: usize = 1 << 14;

/// A buffer address captured at planning time.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BufferAddr(NonNull<u8>);

// SAFETY: the address is only dereferenced inside `execute`, whose
// contract requires the caller to own the buffers for the duration.
unsafe impl Send for BufferAddr {}
// SAFETY: as above; the address itself is never mutated.
unsafe impl Sync for BufferAddr {}

impl BufferAddr {
    pub(crate) fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    fn cast<T>(self) -> *mut T {
        self.0.as_ptr().cast::<T>()
    }
}

/// Everything needed to run one transform.
pub(crate) struct CompiledPlan {
    pub(crate) kind: TransformKind,
    pub(crate) extents: SmallVec<[usize; 4]>,
    pub(crate) input: BufferAddr,
    pub(crate) output: BufferAddr,
    /// One kernel per axis, in axis order.
    pub(crate) kernels: Vec<Kernel>,
    pub(crate) workers: usize,
}

impl CompiledPlan {
    fn len(&self) -> usize {
        self.extents.iter().product()
    }

    fn half_len(&self) -> usize {
        let last = self.extents[self.extents.len() - 1];
        self.len() / last * (last / 2 + 1)
    }

    /// Run the transform on the captured buffers.
    ///
    /// # Safety
    ///
    /// The captured buffers must be valid for the layout of `kind` and
    /// not accessed elsewhere during the call.
    pub(crate) unsafe fn execute(&self) {
        let n = self.len();
        match self.kind {
            TransformKind::ComplexToComplex => {
                let input = self.input.cast::<Complex64>();
                let output = self.output.cast::<Complex64>();
                // SAFETY: both buffers hold `n` complex elements; `copy`
                // tolerates input == output.
                let data = unsafe {
                    std::ptr::copy(input, output, n);
                    std::slice::from_raw_parts_mut(output, n)
                };
                self.run_axes(data);
            }
            TransformKind::RealToComplex => {
                // SAFETY: the input holds `n` reals.
                let input = unsafe { std::slice::from_raw_parts(self.input.cast::<f64>(), n) };
                let mut work: Vec<Complex64> = input.iter().map(|&re| Complex64::new(re, 0.0)).collect();
                self.run_axes(&mut work);
                // SAFETY: the output holds `half_len` complex elements.
                let output = unsafe {
                    std::slice::from_raw_parts_mut(self.output.cast::<Complex64>(), self.half_len())
                };
                pack_half(&work, output, self.last_extent());
            }
            TransformKind::ComplexToReal => {
                // SAFETY: the input holds `half_len` complex elements.
                let input = unsafe {
                    std::slice::from_raw_parts(self.input.cast::<Complex64>(), self.half_len())
                };
                let mut work = unpack_hermitian(input, &self.extents);
                self.run_axes(&mut work);
                // SAFETY: the output holds `n` reals.
                let output = unsafe { std::slice::from_raw_parts_mut(self.output.cast::<f64>(), n) };
                for (out, c) in output.iter_mut().zip(work.iter()) {
                    *out = c.re;
                }
            }
        }
    }

    fn last_extent(&self) -> usize {
        self.extents[self.extents.len() - 1]
    }

    /// Apply every axis kernel to `data` in place.
    pub(crate) fn run_axes(&self, data: &mut [Complex64]) {
        let rank = self.extents.len();
        for axis in 0..rank {
            let kernel = &self.kernels[axis];
            if kernel.len() == 1 {
                continue;
            }
            let stride: usize = self.extents[axis + 1..].iter().product();
            let block = kernel.len() * stride;
            let blocks = data.len() / block;
            let workers = self.workers.min(blocks);
            if workers > 1 && data.len() >= PARALLEL_MIN_LEN {
                let per_worker = blocks.div_ceil(workers) * block;
                std::thread::scope(|scope| {
                    for chunk in data.chunks_mut(per_worker) {
                        scope.spawn(move || run_blocks(kernel, chunk, block, stride));
                    }
                });
            } else {
                run_blocks(kernel, data, block, stride);
            }
        }
    }
}

fn run_blocks(kernel: &Kernel, data: &mut [Complex64], block: usize, stride: usize) {
    let n = kernel.len();
    let mut line = vec![Complex64::default(); n];
    let mut scratch = Vec::new();
    for chunk in data.chunks_mut(block) {
        if stride == 1 {
            kernel.apply(chunk, &mut scratch);
            continue;
        }
        for start in 0..stride {
            for (k, slot) in line.iter_mut().enumerate() {
                *slot = chunk[start + k * stride];
            }
            kernel.apply(&mut line, &mut scratch);
            for (k, &v) in line.iter().enumerate() {
                chunk[start + k * stride] = v;
            }
        }
    }
}

/// Keep the first `last / 2 + 1` entries of every last-axis line.
fn pack_half(full: &[Complex64], half: &mut [Complex64], last: usize) {
    let h = last / 2 + 1;
    for (src, dst) in full.chunks(last).zip(half.chunks_mut(h)) {
        dst.copy_from_slice(&src[..h]);
    }
}

/// Rebuild the full spectrum from its half, using
/// `X[-i] = conj(X[i])` for the dropped last-axis entries.
fn unpack_hermitian(half: &[Complex64], extents: &[usize]) -> Vec<Complex64> {
    let rank = extents.len();
    let last = extents[rank - 1];
    let h = last / 2 + 1;
    let outer: usize = extents[..rank - 1].iter().product();
    let mut full = vec![Complex64::default(); outer * last];

    let mut index: SmallVec<[usize; 4]> = SmallVec::from_elem(0, rank.saturating_sub(1));
    for row in 0..outer {
        // Row of the mirrored outer index (-i mod n on every outer axis).
        let mut mirrored = 0usize;
        for (axis, &i) in index.iter().enumerate() {
            let n = extents[axis];
            mirrored = mirrored * n + (n - i) % n;
        }
        for k in 0..last {
            full[row * last + k] = if k < h {
                half[row * h + k]
            } else {
                half[mirrored * h + (last - k)].conj()
            };
        }
        // Advance the outer multi-index, last outer axis fastest.
        for axis in (0..rank - 1).rev() {
            index[axis] += 1;
            if index[axis] < extents[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    full
}
