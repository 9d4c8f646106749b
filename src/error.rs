use thiserror::Error;

/// Failure of the remote text-generation capability.
///
/// Every variant is recoverable: the classifier logs it and falls back to
/// the heuristic matcher.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Connection refused, DNS failure, reset, ...
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Endpoint answered with a non-2xx status.
    #[error("endpoint returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// Body could not be decoded as the backend's envelope.
    #[error("unexpected response body: {0}")]
    Body(String),

    /// No backend configured for this classifier.
    #[error("remote inference unavailable")]
    Unavailable,
}

/// The model answered, but not with the structured object we asked for.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("model output has the wrong shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid CSS selector '{0}'")]
    Selector(String),

    #[error("page has no form at index {index} ({available} found)")]
    NoForm { index: usize, available: usize },
}

/// Errors surfaced by loading, synthesis and the CLI.
#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AutofillError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AutofillError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AutofillError::Json {
            context: context.into(),
            source,
        }
    }
}
