//! Plans bound to a pair of views.
//!
//! A [`Plan`] borrows its input and output views for its whole life, so
//! neither view can be released, moved, or resized while the engine
//! holds their addresses. Dropping the plan destroys the engine plan
//! under the planning lock.
//!
//! A plan that the engine declined to build (the normal outcome of a
//! wisdom-only request without matching wisdom) is still a `Plan`, but
//! an unmaterialized one: [`Plan::execute`] on it fails with
//! [`SpectraError::PlanNotMaterialized`].

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use spectra_arena::NdArray;
use spectra_core::{
    Complex64, Direction, Element, PlannerFlags, Resource, Shape, SpectraError, TransformKind,
};
use spectra_engine::{PlanHandle, PlanRequest, Runtime};

/// Lifecycle of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlanState {
    Ready(PlanHandle),
    Unmaterialized,
    Released,
}

/// Problem description shared by every constructor.
struct Problem {
    kind: TransformKind,
    direction: Direction,
    shape: Shape,
    flags: PlannerFlags,
    workers: usize,
}

/// An engine plan bound to an input and an output view.
///
/// `I` and `O` are the element types of the two views: complex to
/// complex, real to complex, or complex to real.
pub struct Plan<'a, I: Element, O: Element> {
    runtime: Arc<Runtime>,
    input: &'a dyn NdArray<I>,
    output: &'a dyn NdArray<O>,
    kind: TransformKind,
    direction: Direction,
    shape: Shape,
    state: PlanState,
}

impl<'a> Plan<'a, Complex64, Complex64> {
    /// Plan a complex transform over the input view's shape.
    ///
    /// The output must have the same shape. `input` and `output` may be
    /// the same view.
    pub fn dft(
        runtime: &Arc<Runtime>,
        input: &'a dyn NdArray<Complex64>,
        output: &'a dyn NdArray<Complex64>,
        direction: Direction,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<Self, SpectraError> {
        input.ensure_live()?;
        output.ensure_live()?;
        expect_shape(output.shape(), input.shape())?;
        let shape = input.shape().clone();
        Self::build(
            runtime,
            input,
            output,
            Problem {
                kind: TransformKind::ComplexToComplex,
                direction,
                shape,
                flags,
                workers,
            },
        )
    }

    /// Plan a complex transform of an explicit logical shape over two
    /// views that each hold at least that many elements.
    pub fn dft_with_shape(
        runtime: &Arc<Runtime>,
        input: &'a dyn NdArray<Complex64>,
        output: &'a dyn NdArray<Complex64>,
        extents: &[usize],
        direction: Direction,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<Self, SpectraError> {
        input.ensure_live()?;
        output.ensure_live()?;
        let shape = Shape::new(extents)?;
        expect_capacity::<Complex64>(input.len(), shape.len())?;
        expect_capacity::<Complex64>(output.len(), shape.len())?;
        Self::build(
            runtime,
            input,
            output,
            Problem {
                kind: TransformKind::ComplexToComplex,
                direction,
                shape,
                flags,
                workers,
            },
        )
    }
}

impl<'a> Plan<'a, f64, Complex64> {
    /// Plan a forward real-to-complex transform over the input view's
    /// shape. The output must have the input's complex extents.
    pub fn r2c(
        runtime: &Arc<Runtime>,
        input: &'a dyn NdArray<f64>,
        output: &'a dyn NdArray<Complex64>,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<Self, SpectraError> {
        input.ensure_live()?;
        output.ensure_live()?;
        expect_shape(output.shape(), &input.shape().complex_extents())?;
        let shape = input.shape().clone();
        Self::build(
            runtime,
            input,
            output,
            Problem {
                kind: TransformKind::RealToComplex,
                direction: Direction::Forward,
                shape,
                flags,
                workers,
            },
        )
    }
}

impl<'a> Plan<'a, Complex64, f64> {
    /// Plan a backward complex-to-real transform over the output view's
    /// shape. The input must have the output's complex extents.
    pub fn c2r(
        runtime: &Arc<Runtime>,
        input: &'a dyn NdArray<Complex64>,
        output: &'a dyn NdArray<f64>,
        flags: PlannerFlags,
        workers: usize,
    ) -> Result<Self, SpectraError> {
        input.ensure_live()?;
        output.ensure_live()?;
        expect_shape(input.shape(), &output.shape().complex_extents())?;
        let shape = output.shape().clone();
        Self::build(
            runtime,
            input,
            output,
            Problem {
                kind: TransformKind::ComplexToReal,
                direction: Direction::Backward,
                shape,
                flags,
                workers,
            },
        )
    }
}

impl<'a, I: Element, O: Element> Plan<'a, I, O> {
    /// Ask the engine for a plan. Both views have been checked live and
    /// sized for `problem` by the caller.
    fn build(
        runtime: &Arc<Runtime>,
        input: &'a dyn NdArray<I>,
        output: &'a dyn NdArray<O>,
        problem: Problem,
    ) -> Result<Self, SpectraError> {
        let request = PlanRequest {
            kind: problem.kind,
            direction: problem.direction,
            extents: problem.shape.extents(),
            input: input.as_ptr()?.cast::<u8>(),
            output: output.as_ptr()?.cast::<u8>(),
            flags: problem.flags,
        };
        let handle = {
            let session = runtime.session();
            // SAFETY: both views are live and hold at least the element
            // counts the request's layout needs.
            unsafe { session.build_plan(problem.workers.max(1), &request) }
        };
        let state = match handle {
            Some(handle) => PlanState::Ready(handle),
            None => PlanState::Unmaterialized,
        };
        Ok(Self {
            runtime: Arc::clone(runtime),
            input,
            output,
            kind: problem.kind,
            direction: problem.direction,
            shape: problem.shape,
            state,
        })
    }

    /// Run the transform on the bound views.
    pub fn execute(&self) -> Result<(), SpectraError> {
        match self.state {
            PlanState::Ready(handle) => {
                // SAFETY: the plan borrows both views for its lifetime,
                // so they are live and cannot be released or moved; the
                // views are !Sync, so nothing else touches them during
                // the call.
                unsafe { self.runtime.execute(handle) };
                Ok(())
            }
            PlanState::Unmaterialized => Err(SpectraError::PlanNotMaterialized),
            PlanState::Released => Err(SpectraError::disposed(Resource::Plan)),
        }
    }

    /// Destroy the engine plan. Idempotent.
    pub fn release(&mut self) {
        if let PlanState::Ready(handle) = self.state {
            self.runtime.session().destroy_plan(handle);
        }
        self.state = PlanState::Released;
    }

    /// Whether the engine produced a plan that can run.
    pub fn is_executable(&self) -> bool {
        matches!(self.state, PlanState::Ready(_))
    }

    /// Whether [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.state == PlanState::Released
    }

    /// Element-type combination.
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// Exponent sign.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Logical shape of the transform.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of transformed axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// The bound input view.
    pub fn input(&self) -> &'a dyn NdArray<I> {
        self.input
    }

    /// The bound output view.
    pub fn output(&self) -> &'a dyn NdArray<O> {
        self.output
    }

    /// Whether input and output are the same memory.
    pub fn is_in_place(&self) -> bool {
        self.input.base_ptr().cast::<u8>() == self.output.base_ptr().cast::<u8>()
    }
}

impl<I: Element, O: Element> Drop for Plan<'_, I, O> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<I: Element, O: Element> fmt::Debug for Plan<'_, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("shape", &self.shape.to_string())
            .field("state", &self.state)
            .finish()
    }
}

/// Whether two views share a base address.
pub(crate) fn same_memory<A: Element, B: Element>(
    a: &dyn NdArray<A>,
    b: &dyn NdArray<B>,
) -> Result<bool, SpectraError> {
    let a: NonNull<u8> = a.as_ptr()?.cast();
    let b: NonNull<u8> = b.as_ptr()?.cast();
    Ok(a == b)
}

fn expect_shape(found: &Shape, expected: &Shape) -> Result<(), SpectraError> {
    if found != expected {
        return Err(SpectraError::ShapeMismatch {
            expected: expected.extents().to_vec(),
            found: found.extents().to_vec(),
        });
    }
    Ok(())
}

fn expect_capacity<T: Element>(available: usize, required: usize) -> Result<(), SpectraError> {
    if available < required {
        return Err(SpectraError::UndersizedBuffer {
            required: required * T::SIZE,
            available: available * T::SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_arena::{AlignedArrayComplex, AlignedArrayReal};
    use spectra_engine::ReferenceEngine;

    fn runtime() -> Arc<Runtime> {
        Runtime::new(Box::new(ReferenceEngine::new())).unwrap()
    }

    #[test]
    fn estimate_plan_executes() {
        let rt = runtime();
        let input = AlignedArrayComplex::new(16, &[4]).unwrap();
        let output = AlignedArrayComplex::new(16, &[4]).unwrap();
        let plan = Plan::dft(&rt, &input, &output, Direction::Forward, PlannerFlags::ESTIMATE, 1).unwrap();
        assert!(plan.is_executable());
        assert!(!plan.is_in_place());
        input.set1(0, Complex64::new(2.0, 0.0)).unwrap();
        plan.execute().unwrap();
        for k in 0..4 {
            assert!((output.get1(k).unwrap() - Complex64::new(2.0, 0.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn wisdom_only_without_wisdom_is_a_sentinel() {
        let rt = runtime();
        let data = AlignedArrayComplex::new(16, &[3, 7]).unwrap();
        let plan = Plan::dft(&rt, &data, &data, Direction::Forward, PlannerFlags::WISDOM_ONLY, 1).unwrap();
        assert!(!plan.is_executable());
        assert!(!plan.is_released());
        assert_eq!(plan.execute(), Err(SpectraError::PlanNotMaterialized));
    }

    #[test]
    fn release_is_idempotent() {
        let rt = runtime();
        let data = AlignedArrayComplex::new(16, &[8]).unwrap();
        let mut plan = Plan::dft(&rt, &data, &data, Direction::Backward, PlannerFlags::ESTIMATE, 1).unwrap();
        assert!(plan.is_in_place());
        plan.release();
        plan.release();
        assert!(plan.is_released());
        assert_eq!(plan.execute(), Err(SpectraError::disposed(Resource::Plan)));
    }

    #[test]
    fn disposed_view_rejected_before_engine_call() {
        let rt = runtime();
        let mut input = AlignedArrayComplex::new(16, &[8]).unwrap();
        let output = AlignedArrayComplex::new(16, &[8]).unwrap();
        input.release();
        let err = Plan::dft(&rt, &input, &output, Direction::Forward, PlannerFlags::ESTIMATE, 1).unwrap_err();
        assert_eq!(err, SpectraError::disposed(Resource::View));
    }

    #[test]
    fn shapes_are_checked() {
        let rt = runtime();
        let input = AlignedArrayComplex::new(16, &[8]).unwrap();
        let output = AlignedArrayComplex::new(16, &[2, 4]).unwrap();
        assert!(matches!(
            Plan::dft(&rt, &input, &output, Direction::Forward, PlannerFlags::ESTIMATE, 1),
            Err(SpectraError::ShapeMismatch { .. })
        ));

        let real = AlignedArrayReal::new(16, &[10]).unwrap();
        let half = AlignedArrayComplex::new(16, &[5]).unwrap();
        assert!(matches!(
            Plan::r2c(&rt, &real, &half, PlannerFlags::ESTIMATE, 1),
            Err(SpectraError::ShapeMismatch { .. })
        ));
        let half = AlignedArrayComplex::new(16, &[6]).unwrap();
        let plan = Plan::r2c(&rt, &real, &half, PlannerFlags::ESTIMATE, 1).unwrap();
        assert_eq!(plan.kind(), TransformKind::RealToComplex);
        assert_eq!(plan.shape().extents(), &[10]);
    }

    #[test]
    fn explicit_shape_needs_capacity() {
        let rt = runtime();
        let big = AlignedArrayComplex::new(16, &[16]).unwrap();
        let small = AlignedArrayComplex::new(16, &[4]).unwrap();
        let plan = Plan::dft_with_shape(&rt, &big, &big, &[2, 8], Direction::Forward, PlannerFlags::ESTIMATE, 1)
            .unwrap();
        assert_eq!(plan.rank(), 2);
        assert!(matches!(
            Plan::dft_with_shape(&rt, &small, &big, &[2, 8], Direction::Forward, PlannerFlags::ESTIMATE, 1),
            Err(SpectraError::UndersizedBuffer { .. })
        ));
    }
}
