//! Terminal stages
//!
//! A terminal consumes the elements that made it through the stage chain and
//! produces the procedure's result. `Collect` is used when no terminal stage was
//! declared.

use std::fmt::Display;
use std::ops::ControlFlow;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::callback::{Predicate, Reducer};
use crate::error::{PipelineError, Result};

/// Result-producing end of a fused pipeline
pub trait Terminal<T, C> {
    /// Running accumulator for one invocation
    type Acc;

    /// Value returned to the caller
    type Output;

    /// Called once at compile time, before the first invocation.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Initial accumulator; `capacity` is the planned output size hint.
    fn start(&self, capacity: usize) -> Self::Acc;

    /// Consume one element. `Break` ends the whole invocation with a result.
    fn accept(
        &self,
        acc: Self::Acc,
        value: T,
        index: usize,
        ctx: &C,
    ) -> ControlFlow<Self::Output, Self::Acc>;

    /// Result after the input was exhausted without breaking.
    fn finish(&self, acc: Self::Acc) -> Self::Output;
}

/// Gather surviving elements into a `Vec`
#[derive(Clone, Copy, Debug, Default)]
pub struct Collect;

impl<T, C> Terminal<T, C> for Collect {
    type Acc = Vec<T>;
    type Output = Vec<T>;

    fn start(&self, capacity: usize) -> Vec<T> {
        Vec::with_capacity(capacity)
    }

    #[inline(always)]
    fn accept(
        &self,
        mut acc: Vec<T>,
        value: T,
        _index: usize,
        _ctx: &C,
    ) -> ControlFlow<Vec<T>, Vec<T>> {
        acc.push(value);
        ControlFlow::Continue(acc)
    }

    fn finish(&self, acc: Vec<T>) -> Vec<T> {
        acc
    }
}

/// Fold into an accumulator seeded with an embedded initial value
pub struct Reduce<R, A> {
    reducer: R,
    initial: A,
}

impl<R, A> Reduce<R, A> {
    pub fn new(reducer: R, initial: A) -> Self {
        Reduce { reducer, initial }
    }
}

impl<T, C, R, A> Terminal<T, C> for Reduce<R, A>
where
    R: Reducer<A, T, C>,
    A: Clone + PartialEq + Serialize + DeserializeOwned,
{
    type Acc = A;
    type Output = A;

    fn prepare(&self) -> Result<()> {
        check_embeddable(&self.initial)
    }

    fn start(&self, _capacity: usize) -> A {
        self.initial.clone()
    }

    #[inline(always)]
    fn accept(&self, acc: A, value: T, index: usize, ctx: &C) -> ControlFlow<A, A> {
        ControlFlow::Continue(self.reducer.fold(acc, value, index, ctx))
    }

    fn finish(&self, acc: A) -> A {
        acc
    }
}

/// Check that a value survives the JSON embedding format unchanged.
///
/// The decoded snapshot must equal the original. Non-finite floats encode as
/// `null`, so they either fail to decode or decode to something else (`None`
/// for `Some(NaN)`). Maps keyed by non-strings fail to encode.
fn check_embeddable<A>(value: &A) -> Result<()>
where
    A: PartialEq + Serialize + DeserializeOwned,
{
    let not_embeddable = |e: serde_json::Error| PipelineError::NotEmbeddable {
        reason: e.to_string(),
    };

    let encoded = serde_json::to_value(value).map_err(not_embeddable)?;
    let decoded: A = serde_json::from_value(encoded).map_err(not_embeddable)?;
    if decoded != *value {
        return Err(PipelineError::NotEmbeddable {
            reason: "value changes across a JSON round trip".to_string(),
        });
    }
    Ok(())
}

/// Concatenate elements with a separator
#[derive(Clone, Debug)]
pub struct Join {
    separator: String,
}

impl Join {
    pub fn new(separator: impl Into<String>) -> Self {
        Join { separator: separator.into() }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Default for Join {
    fn default() -> Self {
        Join::new(",")
    }
}

impl<T: Display, C> Terminal<T, C> for Join {
    type Acc = String;
    type Output = String;

    fn start(&self, _capacity: usize) -> String {
        String::new()
    }

    #[inline(always)]
    fn accept(
        &self,
        mut acc: String,
        value: T,
        index: usize,
        _ctx: &C,
    ) -> ControlFlow<String, String> {
        // index counts the elements that reached this stage
        if index > 0 {
            acc.push_str(&self.separator);
        }
        acc.push_str(&value.to_string());
        ControlFlow::Continue(acc)
    }

    fn finish(&self, acc: String) -> String {
        acc
    }
}

/// First element matching a predicate
pub struct Find<P>(pub P);

impl<T, C, P: Predicate<T, C>> Terminal<T, C> for Find<P> {
    type Acc = ();
    type Output = Option<T>;

    fn start(&self, _capacity: usize) {}

    #[inline(always)]
    fn accept(&self, _acc: (), value: T, index: usize, ctx: &C) -> ControlFlow<Option<T>> {
        if self.0.test(&value, index, ctx) {
            return ControlFlow::Break(Some(value));
        }
        ControlFlow::Continue(())
    }

    fn finish(&self, _acc: ()) -> Option<T> {
        None
    }
}

/// Visible index of the first element matching a predicate
pub struct FindIndex<P>(pub P);

impl<T, C, P: Predicate<T, C>> Terminal<T, C> for FindIndex<P> {
    type Acc = ();
    type Output = Option<usize>;

    fn start(&self, _capacity: usize) {}

    #[inline(always)]
    fn accept(&self, _acc: (), value: T, index: usize, ctx: &C) -> ControlFlow<Option<usize>> {
        if self.0.test(&value, index, ctx) {
            return ControlFlow::Break(Some(index));
        }
        ControlFlow::Continue(())
    }

    fn finish(&self, _acc: ()) -> Option<usize> {
        None
    }
}

/// Whether any element matches
pub struct AnyMatch<P>(pub P);

impl<T, C, P: Predicate<T, C>> Terminal<T, C> for AnyMatch<P> {
    type Acc = ();
    type Output = bool;

    fn start(&self, _capacity: usize) {}

    #[inline(always)]
    fn accept(&self, _acc: (), value: T, index: usize, ctx: &C) -> ControlFlow<bool> {
        if self.0.test(&value, index, ctx) {
            return ControlFlow::Break(true);
        }
        ControlFlow::Continue(())
    }

    fn finish(&self, _acc: ()) -> bool {
        false
    }
}

/// Whether every element matches
pub struct AllMatch<P>(pub P);

impl<T, C, P: Predicate<T, C>> Terminal<T, C> for AllMatch<P> {
    type Acc = ();
    type Output = bool;

    fn start(&self, _capacity: usize) {}

    #[inline(always)]
    fn accept(&self, _acc: (), value: T, index: usize, ctx: &C) -> ControlFlow<bool> {
        if !self.0.test(&value, index, ctx) {
            return ControlFlow::Break(false);
        }
        ControlFlow::Continue(())
    }

    fn finish(&self, _acc: ()) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::callback::Plain;
    use std::collections::HashMap;

    fn drive<K: Terminal<i32, ()>>(terminal: &K, input: &[i32]) -> K::Output {
        let mut acc = terminal.start(input.len());
        for (i, v) in input.iter().enumerate() {
            acc = match terminal.accept(acc, *v, i, &()) {
                ControlFlow::Continue(acc) => acc,
                ControlFlow::Break(out) => return out,
            };
        }
        terminal.finish(acc)
    }

    #[test]
    fn test_join_default_separator() {
        assert_eq!(drive(&Join::default(), &[1, 2, 3]), "1,2,3");
        assert_eq!(drive(&Join::new(" | "), &[7]), "7");
        assert_eq!(drive(&Join::default(), &[]), "");
    }

    #[test]
    fn test_short_circuit_terminals() {
        let even = || Plain(|v: &i32, _: usize| v % 2 == 0);
        assert_eq!(drive(&Find(even()), &[1, 3, 4, 6]), Some(4));
        assert_eq!(drive(&FindIndex(even()), &[1, 3, 4, 6]), Some(2));
        assert_eq!(drive(&FindIndex(even()), &[1, 3]), None);
        assert!(drive(&AnyMatch(even()), &[1, 2]));
        assert!(!drive(&AllMatch(even()), &[2, 3]));
        assert!(drive(&AllMatch(even()), &[]));
    }

    #[test]
    fn test_reduce_starts_from_initial_value_each_run() {
        let doubled = Reduce::new(
            Plain(|mut acc: Vec<i32>, v: i32, _: usize| {
                acc.push(v * 2);
                acc
            }),
            vec![0],
        );
        Terminal::<i32, ()>::prepare(&doubled).unwrap();
        assert_eq!(drive(&doubled, &[1, 2]), vec![0, 2, 4]);
        assert_eq!(drive(&doubled, &[5]), vec![0, 10]);
    }

    #[test]
    fn test_lossy_initial_value_is_rejected() {
        // NaN inside an Option encodes as null and decodes as None.
        let reduce = Reduce::new(Plain(|acc: Option<f64>, _: i32, _: usize| acc), Some(f64::NAN));
        let err = Terminal::<i32, ()>::prepare(&reduce).unwrap_err();
        assert!(matches!(err, PipelineError::NotEmbeddable { .. }), "got: {err}");

        let nested = Reduce::new(
            Plain(|acc: Vec<Option<f64>>, _: i32, _: usize| acc),
            vec![Some(1.5), Some(f64::INFINITY)],
        );
        assert!(Terminal::<i32, ()>::prepare(&nested).is_err());

        let finite = Reduce::new(Plain(|acc: Option<f64>, _: i32, _: usize| acc), Some(0.1));
        assert!(Terminal::<i32, ()>::prepare(&finite).is_ok());
    }

    #[test]
    fn test_non_finite_initial_value_is_rejected() {
        let reduce = Reduce::new(Plain(|acc: f64, v: i32, _: usize| acc + v as f64), f64::NAN);
        let err = Terminal::<i32, ()>::prepare(&reduce).unwrap_err();
        assert!(matches!(err, PipelineError::NotEmbeddable { .. }), "got: {err}");
    }

    #[test]
    fn test_non_string_map_keys_are_rejected() {
        let initial: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);
        let reduce = Reduce::new(
            Plain(|acc: HashMap<(i32, i32), i32>, _: i32, _: usize| acc),
            initial,
        );
        assert!(Terminal::<i32, ()>::prepare(&reduce).is_err());
    }
}
