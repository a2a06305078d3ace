//! Error types for post extraction

use thiserror::Error;
use tgmirror_types::PostId;

/// Extraction errors. Any of these aborts the extraction, so no partial
/// document is ever written.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The message has no public link, so its embed page cannot be addressed
    #[error("message {message_id} has no public link")]
    MissingLink {
        /// Message id of the offending message
        message_id: PostId,
    },

    /// The embed page could not be reached
    #[error("failed to fetch embed page {url}: {source}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The embed page answered with a non-success status
    #[error("embed page {url} returned {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Response status
        status: reqwest::StatusCode,
    },

    /// HTTP client construction failed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A built-in selector or pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(String),
}

impl ExtractError {
    /// Whether calling again later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractError::Fetch { .. } => true,
            ExtractError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            ExtractError::MissingLink { .. } | ExtractError::Client(_) | ExtractError::Pattern(_) => {
                false
            }
        }
    }
}

impl From<regex::Error> for ExtractError {
    fn from(err: regex::Error) -> Self {
        ExtractError::Pattern(err.to_string())
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, ExtractError>;
