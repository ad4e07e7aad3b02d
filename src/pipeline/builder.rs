//! Pipeline builder
//!
//! `Pipeline` is the open state: every stage method consumes it and returns a
//! new builder whose type carries the grown stage chain. Terminal methods move
//! it into `Sealed`, which only knows how to build. A pipeline therefore has at
//! most one terminal stage and nothing can be appended once it is sealed.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::callback::{Contextual, Plain};
use super::executor::{FusedProcedure, SharedProcedure};
use super::fused::{Filter, ForEach, Map, Source, Stage};
use super::ir::{OperationQueue, StageDescriptor, StageKind};
use super::planner::Planner;
use super::terminal::{AllMatch, AnyMatch, Collect, Find, FindIndex, Join, Reduce, Terminal};
use crate::error::Result;

/// Start an empty pipeline over elements of type `T`
pub fn pipeline<T>() -> Pipeline<Source<T>> {
    Pipeline::new()
}

/// Start an empty pipeline whose `*_with` callbacks receive a `&C` context
pub fn contextual<T, C>() -> Pipeline<Source<T>, C> {
    Pipeline::new()
}

/// Open pipeline builder
pub struct Pipeline<S, C = ()> {
    stages: S,
    queue: OperationQueue,
    _context: PhantomData<fn(&C)>,
}

impl<T, C> Pipeline<Source<T>, C> {
    pub fn new() -> Self {
        Pipeline {
            stages: Source::new(),
            queue: OperationQueue::new(),
            _context: PhantomData,
        }
    }
}

impl<T, C> Default for Pipeline<Source<T>, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> Pipeline<S, C>
where
    S: Stage<C>,
{
    /// Stages declared so far
    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    fn then<N>(self, stage: StageDescriptor, wrap: impl FnOnce(S) -> N) -> Pipeline<N, C> {
        let mut queue = self.queue;
        queue.push(stage);
        Pipeline {
            stages: wrap(self.stages),
            queue,
            _context: PhantomData,
        }
    }

    fn seal<K>(self, stage: Option<StageDescriptor>, terminal: K) -> Sealed<S, K, C> {
        let mut queue = self.queue;
        if let Some(stage) = stage {
            queue.push(stage);
        }
        let plan = Planner::plan(&queue);
        Sealed {
            procedure: Arc::new(FusedProcedure::new(self.stages, terminal, plan)),
            compiled: Mutex::new(false),
        }
    }

    /// Keep elements for which `predicate(value, index)` is true
    pub fn filter<F>(self, predicate: F) -> Pipeline<Filter<S, Plain<F>>, C>
    where
        F: Fn(&S::Out, usize) -> bool,
    {
        self.then(StageDescriptor::new(StageKind::Filter), |s| {
            Filter::new(s, Plain(predicate))
        })
    }

    pub fn filter_with<F>(self, predicate: F) -> Pipeline<Filter<S, Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C) -> bool,
    {
        self.then(StageDescriptor::contextual(StageKind::Filter), |s| {
            Filter::new(s, Contextual(predicate))
        })
    }

    /// Replace each element with `mapper(value, index)`
    pub fn map<U, F>(self, mapper: F) -> Pipeline<Map<S, Plain<F>>, C>
    where
        F: Fn(S::Out, usize) -> U,
    {
        self.then(StageDescriptor::new(StageKind::Map), |s| Map::new(s, Plain(mapper)))
    }

    pub fn map_with<U, F>(self, mapper: F) -> Pipeline<Map<S, Contextual<F>>, C>
    where
        F: Fn(S::Out, usize, &C) -> U,
    {
        self.then(StageDescriptor::contextual(StageKind::Map), |s| {
            Map::new(s, Contextual(mapper))
        })
    }

    /// Call `callback(value, index)` for its side effect
    pub fn for_each<F>(self, callback: F) -> Pipeline<ForEach<S, Plain<F>>, C>
    where
        F: Fn(&S::Out, usize),
    {
        self.then(StageDescriptor::new(StageKind::ForEach), |s| {
            ForEach::new(s, Plain(callback))
        })
    }

    pub fn for_each_with<F>(self, callback: F) -> Pipeline<ForEach<S, Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C),
    {
        self.then(StageDescriptor::contextual(StageKind::ForEach), |s| {
            ForEach::new(s, Contextual(callback))
        })
    }

    /// Fold the elements, starting every run from `initial`.
    ///
    /// `initial` must survive a JSON round trip; this is checked by `build`.
    pub fn reduce<A, F>(self, reducer: F, initial: A) -> Sealed<S, Reduce<Plain<F>, A>, C>
    where
        F: Fn(A, S::Out, usize) -> A,
        A: Clone + PartialEq + Serialize + DeserializeOwned,
    {
        self.seal(
            Some(StageDescriptor::new(StageKind::Reduce)),
            Reduce::new(Plain(reducer), initial),
        )
    }

    pub fn reduce_with<A, F>(self, reducer: F, initial: A) -> Sealed<S, Reduce<Contextual<F>, A>, C>
    where
        F: Fn(A, S::Out, usize, &C) -> A,
        A: Clone + PartialEq + Serialize + DeserializeOwned,
    {
        self.seal(
            Some(StageDescriptor::contextual(StageKind::Reduce)),
            Reduce::new(Contextual(reducer), initial),
        )
    }

    /// Concatenate the elements separated by `,`
    pub fn join(self) -> Sealed<S, Join, C> {
        self.join_by(",")
    }

    /// Concatenate the elements separated by `separator`
    pub fn join_by(self, separator: impl Into<String>) -> Sealed<S, Join, C> {
        let join = Join::new(separator);
        self.seal(Some(StageDescriptor::join(join.separator())), join)
    }

    /// First element matching `predicate`, or `None`
    pub fn find<F>(self, predicate: F) -> Sealed<S, Find<Plain<F>>, C>
    where
        F: Fn(&S::Out, usize) -> bool,
    {
        self.seal(Some(StageDescriptor::new(StageKind::Find)), Find(Plain(predicate)))
    }

    pub fn find_with<F>(self, predicate: F) -> Sealed<S, Find<Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C) -> bool,
    {
        self.seal(
            Some(StageDescriptor::contextual(StageKind::Find)),
            Find(Contextual(predicate)),
        )
    }

    /// Visible index of the first element matching `predicate`, or `None`
    pub fn find_index<F>(self, predicate: F) -> Sealed<S, FindIndex<Plain<F>>, C>
    where
        F: Fn(&S::Out, usize) -> bool,
    {
        self.seal(
            Some(StageDescriptor::new(StageKind::FindIndex)),
            FindIndex(Plain(predicate)),
        )
    }

    pub fn find_index_with<F>(self, predicate: F) -> Sealed<S, FindIndex<Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C) -> bool,
    {
        self.seal(
            Some(StageDescriptor::contextual(StageKind::FindIndex)),
            FindIndex(Contextual(predicate)),
        )
    }

    /// Whether any element matches `predicate`
    pub fn some<F>(self, predicate: F) -> Sealed<S, AnyMatch<Plain<F>>, C>
    where
        F: Fn(&S::Out, usize) -> bool,
    {
        self.seal(Some(StageDescriptor::new(StageKind::Some)), AnyMatch(Plain(predicate)))
    }

    pub fn some_with<F>(self, predicate: F) -> Sealed<S, AnyMatch<Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C) -> bool,
    {
        self.seal(
            Some(StageDescriptor::contextual(StageKind::Some)),
            AnyMatch(Contextual(predicate)),
        )
    }

    /// Whether every element matches `predicate`; true for an empty input
    pub fn every<F>(self, predicate: F) -> Sealed<S, AllMatch<Plain<F>>, C>
    where
        F: Fn(&S::Out, usize) -> bool,
    {
        self.seal(Some(StageDescriptor::new(StageKind::Every)), AllMatch(Plain(predicate)))
    }

    pub fn every_with<F>(self, predicate: F) -> Sealed<S, AllMatch<Contextual<F>>, C>
    where
        F: Fn(&S::Out, usize, &C) -> bool,
    {
        self.seal(
            Some(StageDescriptor::contextual(StageKind::Every)),
            AllMatch(Contextual(predicate)),
        )
    }

    /// Seal without a terminal stage; the procedure returns the surviving elements
    pub fn collect(self) -> Sealed<S, Collect, C> {
        self.seal(None, Collect)
    }

    /// Shorthand for `collect().build()`
    pub fn build(self) -> Result<Arc<FusedProcedure<S, Collect, C>>>
    where
        S::In: Clone,
    {
        self.collect().build()
    }
}

/// Pipeline whose chain is complete
///
/// Building is memoised: the first successful `build` compiles, later calls
/// return the same procedure. Concurrent first calls wait on one lock, so only
/// one of them compiles.
pub struct Sealed<S, K, C = ()> {
    procedure: Arc<FusedProcedure<S, K, C>>,
    compiled: Mutex<bool>,
}

impl<S, K, C> Sealed<S, K, C>
where
    S: Stage<C>,
    S::In: Clone,
    K: Terminal<S::Out, C>,
{
    /// Declared stages, terminal included
    pub fn queue(&self) -> &OperationQueue {
        &self.procedure.plan().queue
    }

    /// Compile into a fused procedure, or return the one compiled earlier
    pub fn build(&self) -> Result<Arc<FusedProcedure<S, K, C>>> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if !*compiled {
            // A failed prepare leaves the flag unset; the next call retries.
            self.procedure.terminal().prepare()?;
            debug!(
                stages = %self.procedure.plan().queue,
                shape = ?self.procedure.plan().shape,
                "compiled fused pipeline"
            );
            *compiled = true;
        }
        Ok(Arc::clone(&self.procedure))
    }
}

/// Anything that can be compiled into a shared procedure
pub trait IntoProcedure<T, C> {
    type Output;

    fn into_procedure(self) -> Result<SharedProcedure<T, C, Self::Output>>;
}

impl<S, K, C> IntoProcedure<S::In, C> for Sealed<S, K, C>
where
    S: Stage<C> + Send + Sync + 'static,
    S::In: Clone,
    K: Terminal<S::Out, C> + Send + Sync + 'static,
    C: 'static,
{
    type Output = K::Output;

    fn into_procedure(self) -> Result<SharedProcedure<S::In, C, K::Output>> {
        let procedure: SharedProcedure<S::In, C, K::Output> = self.build()?;
        Ok(procedure)
    }
}

impl<S, C> IntoProcedure<S::In, C> for Pipeline<S, C>
where
    S: Stage<C> + Send + Sync + 'static,
    S::In: Clone,
    C: 'static,
{
    type Output = Vec<S::Out>;

    fn into_procedure(self) -> Result<SharedProcedure<S::In, C, Vec<S::Out>>> {
        self.collect().into_procedure()
    }
}
