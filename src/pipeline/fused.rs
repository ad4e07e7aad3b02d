//! Fused stage chain
//!
//! Non-terminal stages are nested generic wrappers around a `Source`. Feeding
//! one element through the outermost wrapper runs every stage for that element,
//! so after monomorphisation the whole chain is a single inlined loop body.
//!
//! Visible index: each stage receives the element's position in the sequence
//! produced by the filters upstream of it. A filter keeps its own survivor
//! counter in the per-run state and hands that counter downstream.

use std::marker::PhantomData;

use super::callback::{Effect, Mapper, Predicate};

/// A fusable, non-terminal stage chain
pub trait Stage<C> {
    /// Element type read from the input sequence
    type In;

    /// Element type handed to the next stage
    type Out;

    /// Per-run state (filter counters), created fresh for every invocation
    type State: Default;

    /// Run one input element through the chain.
    ///
    /// Returns the transformed element with its visible index, or `None` if a
    /// filter dropped it.
    fn feed(
        &self,
        value: Self::In,
        raw: usize,
        state: &mut Self::State,
        ctx: &C,
    ) -> Option<(Self::Out, usize)>;
}

/// Start of every chain: passes elements through with their raw position
pub struct Source<T> {
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Source<T> {
    pub fn new() -> Self {
        Source { _marker: PhantomData }
    }
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> Stage<C> for Source<T> {
    type In = T;
    type Out = T;
    type State = ();

    #[inline(always)]
    fn feed(&self, value: T, raw: usize, _state: &mut (), _ctx: &C) -> Option<(T, usize)> {
        Some((value, raw))
    }
}

/// Keep elements matching a predicate
pub struct Filter<S, P> {
    upstream: S,
    predicate: P,
}

impl<S, P> Filter<S, P> {
    pub fn new(upstream: S, predicate: P) -> Self {
        Filter { upstream, predicate }
    }
}

impl<C, S, P> Stage<C> for Filter<S, P>
where
    S: Stage<C>,
    P: Predicate<S::Out, C>,
{
    type In = S::In;
    type Out = S::Out;
    type State = (S::State, usize);

    #[inline(always)]
    fn feed(
        &self,
        value: S::In,
        raw: usize,
        state: &mut Self::State,
        ctx: &C,
    ) -> Option<(S::Out, usize)> {
        let (value, index) = self.upstream.feed(value, raw, &mut state.0, ctx)?;
        if !self.predicate.test(&value, index, ctx) {
            return None;
        }

        let visible = state.1;
        state.1 += 1;
        Some((value, visible))
    }
}

/// Replace each element
pub struct Map<S, M> {
    upstream: S,
    mapper: M,
}

impl<S, M> Map<S, M> {
    pub fn new(upstream: S, mapper: M) -> Self {
        Map { upstream, mapper }
    }
}

impl<C, S, M> Stage<C> for Map<S, M>
where
    S: Stage<C>,
    M: Mapper<S::Out, C>,
{
    type In = S::In;
    type Out = M::Output;
    type State = S::State;

    #[inline(always)]
    fn feed(
        &self,
        value: S::In,
        raw: usize,
        state: &mut S::State,
        ctx: &C,
    ) -> Option<(M::Output, usize)> {
        let (value, index) = self.upstream.feed(value, raw, state, ctx)?;
        Some((self.mapper.apply(value, index, ctx), index))
    }
}

/// Observe each element without changing it
pub struct ForEach<S, E> {
    upstream: S,
    effect: E,
}

impl<S, E> ForEach<S, E> {
    pub fn new(upstream: S, effect: E) -> Self {
        ForEach { upstream, effect }
    }
}

impl<C, S, E> Stage<C> for ForEach<S, E>
where
    S: Stage<C>,
    E: Effect<S::Out, C>,
{
    type In = S::In;
    type Out = S::Out;
    type State = S::State;

    #[inline(always)]
    fn feed(
        &self,
        value: S::In,
        raw: usize,
        state: &mut S::State,
        ctx: &C,
    ) -> Option<(S::Out, usize)> {
        let (value, index) = self.upstream.feed(value, raw, state, ctx)?;
        self.effect.call(&value, index, ctx);
        Some((value, index))
    }
}
