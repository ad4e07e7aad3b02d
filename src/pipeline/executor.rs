//! Fused procedure executor
//!
//! Drives one stage chain and one terminal over an input sequence in a single
//! pass. The input is validated on every call; elements are cloned into the
//! working value so the input is never mutated.

use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::warn;

use super::execution_plan::ExecutionPlan;
use super::fused::Stage;
use super::terminal::Terminal;
use crate::error::{PipelineError, Result};
use crate::sequence::Sequence;

/// Compiled, reusable single-pass procedure
pub struct FusedProcedure<S, K, C = ()> {
    stages: S,
    terminal: K,
    plan: ExecutionPlan,
    _context: PhantomData<fn(&C)>,
}

impl<S, K, C> FusedProcedure<S, K, C> {
    pub(crate) fn new(stages: S, terminal: K, plan: ExecutionPlan) -> Self {
        FusedProcedure {
            stages,
            terminal,
            plan,
            _context: PhantomData,
        }
    }

    /// Plan this procedure was compiled with
    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub(crate) fn terminal(&self) -> &K {
        &self.terminal
    }
}

impl<S, K, C> FusedProcedure<S, K, C>
where
    S: Stage<C>,
    S::In: Clone,
    K: Terminal<S::Out, C>,
{
    /// Run with a default context
    pub fn execute<I>(&self, input: &I) -> Result<K::Output>
    where
        I: Sequence<Item = S::In> + ?Sized,
        C: Default,
    {
        self.execute_with(input, &C::default())
    }

    /// Run with an explicit context, handed to every `*_with` callback
    pub fn execute_with<I>(&self, input: &I, ctx: &C) -> Result<K::Output>
    where
        I: Sequence<Item = S::In> + ?Sized,
    {
        let elements = elements_of(input)?;
        Ok(self.run(elements, ctx))
    }

    fn run(&self, elements: &[S::In], ctx: &C) -> K::Output {
        let mut state = S::State::default();
        let mut acc = self.terminal.start(self.plan.shape.capacity(elements.len()));

        for (raw, element) in elements.iter().enumerate() {
            let Some((value, index)) = self.stages.feed(element.clone(), raw, &mut state, ctx)
            else {
                continue;
            };

            acc = match self.terminal.accept(acc, value, index, ctx) {
                ControlFlow::Continue(acc) => acc,
                ControlFlow::Break(result) => return result,
            };
        }

        self.terminal.finish(acc)
    }
}

/// Borrow the elements of a sequence, rejecting anything that is not one
fn elements_of<I: Sequence + ?Sized>(input: &I) -> Result<&[I::Item]> {
    input.as_slice().ok_or_else(|| {
        warn!(found = input.kind(), "fused procedure called with a non-sequence");
        PipelineError::InvalidInput { found: input.kind() }
    })
}

/// Object-safe view of a fused procedure
///
/// Hides the stage chain type so procedures with the same element, context and
/// result types can be stored and passed around together.
pub trait Procedure<T, C>: Send + Sync {
    type Output;

    /// Run over already validated elements
    fn run_elements(&self, elements: &[T], ctx: &C) -> Self::Output;

    fn plan(&self) -> &ExecutionPlan;
}

impl<S, K, C> Procedure<S::In, C> for FusedProcedure<S, K, C>
where
    S: Stage<C> + Send + Sync,
    S::In: Clone,
    K: Terminal<S::Out, C> + Send + Sync,
{
    type Output = K::Output;

    fn run_elements(&self, elements: &[S::In], ctx: &C) -> K::Output {
        self.run(elements, ctx)
    }

    fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }
}

/// Shared, type-erased procedure
pub type SharedProcedure<T, C, O> = Arc<dyn Procedure<T, C, Output = O>>;

impl<T, C, O> dyn Procedure<T, C, Output = O> {
    /// Run with a default context
    pub fn execute<I>(&self, input: &I) -> Result<O>
    where
        I: Sequence<Item = T> + ?Sized,
        C: Default,
    {
        self.execute_with(input, &C::default())
    }

    /// Run with an explicit context
    pub fn execute_with<I>(&self, input: &I, ctx: &C) -> Result<O>
    where
        I: Sequence<Item = T> + ?Sized,
    {
        let elements = elements_of(input)?;
        Ok(self.run_elements(elements, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::callback::Plain;
    use crate::pipeline::fused::{Filter, Map, Source};
    use crate::pipeline::ir::{OperationQueue, StageDescriptor, StageKind};
    use crate::pipeline::planner::Planner;
    use crate::pipeline::terminal::{Collect, Join};
    use serde_json::json;

    fn plan_of(kinds: &[StageKind]) -> ExecutionPlan {
        let mut queue = OperationQueue::new();
        for kind in kinds {
            queue.push(StageDescriptor::new(*kind));
        }
        Planner::plan(&queue)
    }

    #[test]
    fn test_execute_filter_map() {
        let stages = Map::new(
            Filter::new(Source::<i32>::new(), Plain(|v: &i32, _: usize| v % 2 == 0)),
            Plain(|v: i32, i: usize| (v, i)),
        );
        let fused: FusedProcedure<_, _> =
            FusedProcedure::new(stages, Collect, plan_of(&[StageKind::Filter, StageKind::Map]));

        let result = fused.execute(&vec![1, 2, 3, 4]).unwrap();
        assert_eq!(result, vec![(2, 0), (4, 1)]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let fused: FusedProcedure<_, _> =
            FusedProcedure::new(Source::<&str>::new(), Collect, plan_of(&[]));
        let input = ["a", "b"];
        assert_eq!(fused.execute(&input).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_non_sequence_on_every_call() {
        let fused: FusedProcedure<_, _> =
            FusedProcedure::new(Source::<i32>::new(), Collect, plan_of(&[]));
        let missing: Option<Vec<i32>> = None;

        for _ in 0..2 {
            let err = fused.execute(&missing).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidInput { found: "none" }));
        }
        assert_eq!(fused.execute(&Some(vec![5])).unwrap(), vec![5]);
    }

    #[test]
    fn test_type_erased_procedure() {
        let fused: FusedProcedure<_, _> = FusedProcedure::new(
            Source::<serde_json::Value>::new(),
            Join::default(),
            plan_of(&[StageKind::Join]),
        );
        let shared: SharedProcedure<serde_json::Value, (), String> = Arc::new(fused);

        assert_eq!(shared.execute(&json!([1, "x", true])).unwrap(), "1,\"x\",true");
        assert!(matches!(
            shared.execute(&json!({"not": "an array"})),
            Err(PipelineError::InvalidInput { found: "object" })
        ));
        assert_eq!(shared.plan().shape, crate::pipeline::OutputShape::Scalar(StageKind::Join));
    }
}
