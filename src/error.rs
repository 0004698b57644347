//! Centralized error types for mailscribe.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by the mailscribe library.
///
/// Extraction, rendering and splicing never fail; only configuration,
/// host access and the remote completion call do.
#[derive(Error, Debug)]
pub enum ScribeError {
    /// A required setting (usually the API key) is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No compose window or displayed message could be resolved.
    #[error("No active target: {0}")]
    NoActiveTarget(String),

    /// The completion API answered with a non-2xx status, after the
    /// degrade-and-retry attempt if one applied.
    #[error("API error {status}: {body}")]
    RemoteCall { status: u16, body: String },

    /// The completion API answered 2xx but carried no usable text.
    #[error("No content returned by the completion API")]
    EmptyResponse,

    /// The source message yielded no text through any extraction path.
    #[error("Message content unavailable: {0}")]
    ContentUnavailable(String),

    /// Summaries of displayed messages are opt-in and currently turned off.
    #[error("Message display summaries are turned off; enable `summary.display_summaries` to opt in")]
    SummariesDisabled,

    /// Transport-level HTTP failure (DNS, TLS, connection reset, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected.
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, ScribeError>`.
pub type Result<T> = std::result::Result<T, ScribeError>;

impl ScribeError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The API key is absent; raised before any network attempt.
    pub fn missing_api_key() -> Self {
        Self::Configuration(
            "API key not set. Add `api.api_key` to the config file or export OPENAI_API_KEY."
                .to_string(),
        )
    }
}

/// Not a failure: the HTML could not be handled as a tree, so the reply was
/// spliced by string concatenation and quote/signature placement is weaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFallbackWarning {
    /// Why the tree strategy was unavailable.
    pub reason: String,
}

impl fmt::Display for ParseFallbackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTML tree unavailable ({}); used string splice", self.reason)
    }
}
