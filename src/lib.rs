//! loopfuse: single-pass fused sequence pipelines
//!
//! Declare filter/map/forEach stages and an optional terminal (reduce, join,
//! find, findIndex, some, every), compile once, run many times. Every run walks
//! the input exactly once and builds no intermediate collections.

pub mod cache;
pub mod error;
pub mod pipeline;
pub mod sequence;

pub use cache::PipelineCache;
pub use error::{PipelineError, Result};
pub use pipeline::{
    contextual, pipeline, ExecutionPlan, FusedProcedure, OutputShape, Pipeline, Procedure,
    Sealed, SharedProcedure, StageKind,
};
pub use sequence::Sequence;
