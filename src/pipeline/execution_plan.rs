//! Execution plan for a compiled pipeline
//!
//! Records the output shape chosen at compile time together with the queue the
//! procedure was compiled from.

use super::ir::{OperationQueue, StageKind};

/// How the fused procedure materialises its result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputShape {
    /// Sequence output with one slot per input element (no filters)
    PreSized,

    /// Sequence output grown as elements survive the filters
    Growable,

    /// Single value produced by the given terminal stage
    Scalar(StageKind),
}

impl OutputShape {
    /// Capacity to reserve for an input of `len` elements
    pub fn capacity(self, len: usize) -> usize {
        match self {
            OutputShape::PreSized => len,
            OutputShape::Growable | OutputShape::Scalar(_) => 0,
        }
    }
}

/// Complete plan for one compiled pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Stages in declaration order
    pub queue: OperationQueue,

    /// Result shape
    pub shape: OutputShape,
}

impl ExecutionPlan {
    /// Number of declared stages
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// An empty plan runs as the identity
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether the procedure can stop before reaching the end of its input
    pub fn short_circuits(&self) -> bool {
        matches!(self.shape, OutputShape::Scalar(kind) if kind.short_circuits())
    }
}
