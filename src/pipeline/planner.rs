//! Pipeline planner
//!
//! Converts an OperationQueue into an ExecutionPlan by picking the output shape:
//! 1. A terminal stage yields a single value
//! 2. Without a terminal, filters make the output size unknown ahead of time

use super::execution_plan::{ExecutionPlan, OutputShape};
use super::ir::OperationQueue;

/// Pipeline planner
pub struct Planner;

impl Planner {
    /// Plan an operation queue
    pub fn plan(queue: &OperationQueue) -> ExecutionPlan {
        ExecutionPlan {
            queue: queue.clone(),
            shape: Self::shape(queue),
        }
    }

    fn shape(queue: &OperationQueue) -> OutputShape {
        if let Some(terminal) = queue.terminal() {
            return OutputShape::Scalar(terminal.kind);
        }

        if queue.has_filter() {
            OutputShape::Growable
        } else {
            OutputShape::PreSized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ir::{StageDescriptor, StageKind};

    fn queue_of(kinds: &[StageKind]) -> OperationQueue {
        let mut queue = OperationQueue::new();
        for kind in kinds {
            queue.push(StageDescriptor::new(*kind));
        }
        queue
    }

    #[test]
    fn test_map_only_is_presized() {
        let plan = Planner::plan(&queue_of(&[StageKind::Map, StageKind::ForEach]));
        assert_eq!(plan.shape, OutputShape::PreSized);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_filter_makes_output_growable() {
        let plan = Planner::plan(&queue_of(&[StageKind::Map, StageKind::Filter]));
        assert_eq!(plan.shape, OutputShape::Growable);
    }

    #[test]
    fn test_terminal_gives_scalar() {
        let plan = Planner::plan(&queue_of(&[
            StageKind::Filter,
            StageKind::Map,
            StageKind::FindIndex,
        ]));
        assert_eq!(plan.shape, OutputShape::Scalar(StageKind::FindIndex));
        assert!(plan.short_circuits());
    }

    #[test]
    fn test_empty_queue() {
        let plan = Planner::plan(&OperationQueue::new());
        assert!(plan.is_empty());
        assert_eq!(plan.shape, OutputShape::PreSized);
    }
}
