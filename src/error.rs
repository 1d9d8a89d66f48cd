use thiserror::Error;

/// Errors raised while decoding or projecting a chart file.
///
/// All variants are terminal for the file being processed; callers that
/// walk a whole chart directory should catch per file and continue.
#[derive(Debug, Error)]
pub enum SrtbError {
    /// The outer document, or a nested value expected to be JSON, failed
    /// to parse. `context` names the envelope key that carried the value.
    #[error("invalid JSON in {context}: {source}")]
    Format {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A structurally required container is absent or the wrong shape.
    #[error("malformed chart structure: {0}")]
    Schema(String),

    /// A required field or cross-referenced key is absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SrtbError {
    pub(crate) fn format(context: impl Into<String>, source: serde_json::Error) -> Self {
        SrtbError::Format {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn missing(path: impl Into<String>) -> Self {
        SrtbError::MissingField(path.into())
    }
}
