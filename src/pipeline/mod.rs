//! Pipeline declaration and fusion
//!
//! This module turns a declared chain of sequence operations into one
//! single-pass procedure:
//!
//! 1. **Builder**: `Pipeline` collects stages; a terminal stage seals it
//! 2. **IR**: every declared stage is also recorded in an `OperationQueue`
//! 3. **Planner**: picks the output shape from the queue
//! 4. **Fused execution**: the typed stage chain and the terminal run in one loop
//!
//! ## Architecture
//!
//! ```text
//! pipeline::<i32>().filter(even).map(inc).reduce(sum, 0)
//!     ↓
//! OperationQueue: [filter, map, reduce]
//!     ↓
//! ExecutionPlan: Scalar(reduce)
//!     ↓
//! FusedProcedure<Map<Filter<Source<i32>, _>, _>, Reduce<_, i32>>: one pass, no intermediates
//! ```
//!
//! ## Visible index
//!
//! Stages see an element's position in the sequence produced by the filters
//! upstream of them, exactly as if every filter materialised its output and
//! the next stage indexed into it.

pub mod builder;
pub mod callback;
pub mod execution_plan;
pub mod executor;
pub mod fused;
pub mod ir;
pub mod planner;
pub mod terminal;

pub use builder::{contextual, pipeline, IntoProcedure, Pipeline, Sealed};
pub use callback::{Contextual, Plain};
pub use execution_plan::{ExecutionPlan, OutputShape};
pub use executor::{FusedProcedure, Procedure, SharedProcedure};
pub use fused::{Filter, ForEach, Map, Source, Stage};
pub use ir::{OperationQueue, StageDescriptor, StageKind};
pub use planner::Planner;
pub use terminal::{AllMatch, AnyMatch, Collect, Find, FindIndex, Join, Reduce, Terminal};
