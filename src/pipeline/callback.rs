//! Stage callbacks
//!
//! Every callback is registered either as `Plain` (value and visible index only)
//! or as `Contextual` (additionally receives the context passed to the fused
//! procedure). The stage wrappers are generic over these traits so both forms
//! inline into the same loop.

/// Callback that does not see the context
#[derive(Clone, Copy, Debug)]
pub struct Plain<F>(pub F);

/// Callback that receives the context as its last argument
#[derive(Clone, Copy, Debug)]
pub struct Contextual<F>(pub F);

pub trait Predicate<T, C> {
    fn test(&self, value: &T, index: usize, ctx: &C) -> bool;
}

pub trait Mapper<T, C> {
    type Output;

    fn apply(&self, value: T, index: usize, ctx: &C) -> Self::Output;
}

pub trait Effect<T, C> {
    fn call(&self, value: &T, index: usize, ctx: &C);
}

pub trait Reducer<A, T, C> {
    fn fold(&self, acc: A, value: T, index: usize, ctx: &C) -> A;
}

impl<T, C, F> Predicate<T, C> for Plain<F>
where
    F: Fn(&T, usize) -> bool,
{
    #[inline(always)]
    fn test(&self, value: &T, index: usize, _ctx: &C) -> bool {
        (self.0)(value, index)
    }
}

impl<T, C, F> Predicate<T, C> for Contextual<F>
where
    F: Fn(&T, usize, &C) -> bool,
{
    #[inline(always)]
    fn test(&self, value: &T, index: usize, ctx: &C) -> bool {
        (self.0)(value, index, ctx)
    }
}

impl<T, U, C, F> Mapper<T, C> for Plain<F>
where
    F: Fn(T, usize) -> U,
{
    type Output = U;

    #[inline(always)]
    fn apply(&self, value: T, index: usize, _ctx: &C) -> U {
        (self.0)(value, index)
    }
}

impl<T, U, C, F> Mapper<T, C> for Contextual<F>
where
    F: Fn(T, usize, &C) -> U,
{
    type Output = U;

    #[inline(always)]
    fn apply(&self, value: T, index: usize, ctx: &C) -> U {
        (self.0)(value, index, ctx)
    }
}

impl<T, C, F> Effect<T, C> for Plain<F>
where
    F: Fn(&T, usize),
{
    #[inline(always)]
    fn call(&self, value: &T, index: usize, _ctx: &C) {
        (self.0)(value, index)
    }
}

impl<T, C, F> Effect<T, C> for Contextual<F>
where
    F: Fn(&T, usize, &C),
{
    #[inline(always)]
    fn call(&self, value: &T, index: usize, ctx: &C) {
        (self.0)(value, index, ctx)
    }
}

impl<A, T, C, F> Reducer<A, T, C> for Plain<F>
where
    F: Fn(A, T, usize) -> A,
{
    #[inline(always)]
    fn fold(&self, acc: A, value: T, index: usize, _ctx: &C) -> A {
        (self.0)(acc, value, index)
    }
}

impl<A, T, C, F> Reducer<A, T, C> for Contextual<F>
where
    F: Fn(A, T, usize, &C) -> A,
{
    #[inline(always)]
    fn fold(&self, acc: A, value: T, index: usize, ctx: &C) -> A {
        (self.0)(acc, value, index, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ignores_context() {
        let even = Plain(|v: &i32, _i: usize| v % 2 == 0);
        assert!(Predicate::<i32, u8>::test(&even, &4, 0, &7));
        assert!(!Predicate::<i32, u8>::test(&even, &3, 0, &7));
    }

    #[test]
    fn test_contextual_sees_context() {
        let above = Contextual(|v: &i32, _i: usize, limit: &i32| v > limit);
        assert!(above.test(&5, 0, &4));
        assert!(!above.test(&5, 0, &5));

        let scale = Contextual(|v: i32, i: usize, k: &i32| v * k + i as i32);
        assert_eq!(scale.apply(3, 1, &10), 31);
    }
}
