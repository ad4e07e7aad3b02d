//! Input sequences accepted by fused procedures
//!
//! A fused procedure walks its input by position, so it only accepts values that
//! can hand out a contiguous, length-known slice. Anything else (a missing
//! `Option`, a JSON scalar or object) is rejected at call time.

use serde_json::Value;

/// An ordered, indexable, length-known collection.
///
/// `as_slice` returns `None` when the value is not a sequence at all; the fused
/// procedure turns that into [`PipelineError::InvalidInput`](crate::PipelineError).
pub trait Sequence {
    type Item;

    /// Borrow the elements, or `None` if this value is not a sequence.
    fn as_slice(&self) -> Option<&[Self::Item]>;

    /// Short name of what this value actually is, used in error messages.
    fn kind(&self) -> &'static str {
        "sequence"
    }
}

impl<T> Sequence for [T] {
    type Item = T;

    fn as_slice(&self) -> Option<&[T]> {
        Some(self)
    }
}

impl<T> Sequence for Vec<T> {
    type Item = T;

    fn as_slice(&self) -> Option<&[T]> {
        Some(self.as_slice())
    }
}

impl<T, const N: usize> Sequence for [T; N] {
    type Item = T;

    fn as_slice(&self) -> Option<&[T]> {
        Some(&self[..])
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Item = S::Item;

    fn as_slice(&self) -> Option<&[S::Item]> {
        (**self).as_slice()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// `None` plays the role of an undefined argument.
impl<S: Sequence> Sequence for Option<S> {
    type Item = S::Item;

    fn as_slice(&self) -> Option<&[S::Item]> {
        self.as_ref().and_then(S::as_slice)
    }

    fn kind(&self) -> &'static str {
        match self {
            Some(inner) => inner.kind(),
            None => "none",
        }
    }
}

/// Untyped JSON input: only arrays are sequences.
impl Sequence for Value {
    type Item = Value;

    fn as_slice(&self) -> Option<&[Value]> {
        self.as_array().map(Vec::as_slice)
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}
