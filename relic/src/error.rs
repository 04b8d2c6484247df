//! Unified error types for the relic pipeline.
//!
//! Every failure in the detection or research pipeline is one of these
//! variants. None of them escape the public `detect`/`research`
//! operations: both convert the error into a sentinel value at the
//! outermost boundary, so callers always receive a structurally
//! complete result.

use std::path::PathBuf;

/// Result type alias for relic operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Longest reply excerpt carried inside a [`PipelineError::Parse`].
const PARSE_EXCERPT_LEN: usize = 200;

/// The main error type for the relic pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Remote image retrieval returned a non-success status.
    #[error("image fetch failed (HTTP {status}): {url}")]
    Fetch {
        /// HTTP status returned by the remote server.
        status: reqwest::StatusCode,
        /// The URL that was requested.
        url: String,
    },

    /// Local image path does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Model reply could not be decoded by any parsing strategy.
    #[error("unparseable model reply: {text}")]
    Parse {
        /// Excerpt of the offending reply text.
        text: String,
    },

    /// The inference endpoint itself failed or returned an error.
    #[error("upstream inference error: {0}")]
    Upstream(String),

    /// A web-search backend failed.
    #[error("search failed: {0}")]
    Search(String),

    /// Invalid or incomplete pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create a parse error carrying an excerpt of the offending text.
    #[must_use]
    pub fn parse(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        let excerpt = if text.chars().count() > PARSE_EXCERPT_LEN {
            let truncated: String = text.chars().take(PARSE_EXCERPT_LEN).collect();
            format!("{truncated}...")
        } else {
            text.to_owned()
        };
        Self::Parse { text: excerpt }
    }

    /// Create an upstream inference error with a message.
    #[must_use]
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a search backend error with a message.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = PipelineError::NotFound {
            path: PathBuf::from("/no/such/file.jpg"),
        };
        assert_eq!(err.to_string(), "File not found: /no/such/file.jpg");
    }

    #[test]
    fn test_parse_excerpt_is_truncated() {
        let long = "x".repeat(1000);
        let err = PipelineError::parse(&long);
        match err {
            PipelineError::Parse { text } => {
                assert!(text.len() < long.len());
                assert!(text.ends_with("..."));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_short_text_kept_verbatim() {
        let err = PipelineError::parse("not json");
        match err {
            PipelineError::Parse { text } => assert_eq!(text, "not json"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
