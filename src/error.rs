//! Pipeline error types.

/// Errors produced while compiling or running a fused pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The procedure was handed something that is not an ordered, indexable sequence.
    #[error("invalid input: expected a sequence, found {found}")]
    InvalidInput { found: &'static str },

    /// A reduce initial value could not be embedded into the compiled procedure.
    #[error("reduce initial value is not embeddable: {reason}")]
    NotEmbeddable { reason: String },

    /// A cached procedure exists under this key but with other element/result types.
    #[error("pipeline cache entry `{key}` was registered with different types")]
    CacheTypeMismatch { key: String },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
