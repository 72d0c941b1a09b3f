use thiserror::Error;

/// Client-input failures raised while turning a request into a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid filter on `{field}`: {reason}")]
    FilterCompilation { field: String, reason: String },

    #[error("invalid pagination: {0}")]
    PipelineBuild(String),

    #[error("unknown relation `{0}`")]
    UnknownJoin(String),
}

impl QueryError {
    pub(crate) fn filter(field: &str, reason: impl Into<String>) -> Self {
        QueryError::FilterCompilation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
