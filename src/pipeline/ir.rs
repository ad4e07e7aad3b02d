//! Operation queue for declared pipeline stages
//!
//! The typed stage chain carries the callbacks; this queue records what was
//! declared, in order, so the planner can pick an output shape and callers can
//! inspect a pipeline without running it.

use std::fmt;

/// Stage identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Keep elements matching a predicate
    Filter,
    /// Replace each element
    Map,
    /// Observe each element
    ForEach,
    /// Fold into an accumulator
    Reduce,
    /// Concatenate into a string
    Join,
    /// First matching element
    Find,
    /// Visible index of the first matching element
    FindIndex,
    /// Any element matches
    Some,
    /// All elements match
    Every,
}

impl StageKind {
    /// Terminal stages end the chain and produce a single value.
    pub fn is_terminal(self) -> bool {
        !matches!(self, StageKind::Filter | StageKind::Map | StageKind::ForEach)
    }

    /// Terminal stages that may stop the loop before the end of the input.
    pub fn short_circuits(self) -> bool {
        matches!(
            self,
            StageKind::Find | StageKind::FindIndex | StageKind::Some | StageKind::Every
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Filter => "filter",
            StageKind::Map => "map",
            StageKind::ForEach => "forEach",
            StageKind::Reduce => "reduce",
            StageKind::Join => "join",
            StageKind::Find => "find",
            StageKind::FindIndex => "findIndex",
            StageKind::Some => "some",
            StageKind::Every => "every",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single declared stage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageDescriptor {
    pub kind: StageKind,

    /// Join separator; `None` for every other kind
    pub separator: Option<String>,

    /// Whether the callback was registered to receive the context value
    pub contextual: bool,
}

impl StageDescriptor {
    pub fn new(kind: StageKind) -> Self {
        StageDescriptor {
            kind,
            separator: None,
            contextual: false,
        }
    }

    pub fn contextual(kind: StageKind) -> Self {
        StageDescriptor {
            contextual: true,
            ..StageDescriptor::new(kind)
        }
    }

    pub fn join(separator: impl Into<String>) -> Self {
        StageDescriptor {
            separator: Some(separator.into()),
            ..StageDescriptor::new(StageKind::Join)
        }
    }
}

/// Ordered list of declared stages
///
/// Append-only: stages are pushed as the builder grows and never removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationQueue {
    stages: Vec<StageDescriptor>,
    has_filter: bool,
    has_terminal: bool,
}

impl OperationQueue {
    /// Create empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage, updating the derived flags
    pub fn push(&mut self, stage: StageDescriptor) {
        self.has_filter |= stage.kind == StageKind::Filter;
        self.has_terminal |= stage.kind.is_terminal();
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    /// The terminal stage, if one was declared
    pub fn terminal(&self) -> Option<&StageDescriptor> {
        self.stages.last().filter(|stage| stage.kind.is_terminal())
    }

    pub fn has_filter(&self) -> bool {
        self.has_filter
    }

    pub fn has_terminal(&self) -> bool {
        self.has_terminal
    }

    /// Number of stages in queue
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for OperationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", stage.kind)?;
        }
        Ok(())
    }
}
