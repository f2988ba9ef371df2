use thiserror::Error;

/// Failure taxonomy for the pipeline.
///
/// `SchemaMismatch` is special: it is collected into extraction reports and
/// printed as a warning, so callers can decide whether a degraded merge is
/// acceptable. The other variants abort the stage that produced them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source '{source}' could not be read: {detail}")]
    SourceUnavailable { source: String, detail: String },

    #[error("source '{source}' has no usable '{column}' column; keys left unnormalized")]
    SchemaMismatch { source: String, column: String },

    #[error("fact row references {dimension} id {id} before it was committed")]
    IntegrityViolation { dimension: &'static str, id: i64 },

    #[error("failed to write '{path}': {detail}")]
    LoadFailure { path: String, detail: String },
}
