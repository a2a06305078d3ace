//! Error types for document assembly and remote store calls

use thiserror::Error;
use tgmirror_types::PostId;

/// Document assembly and parsing errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Front matter could not be serialized or deserialized
    #[error("front matter YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document does not start with a `---` delimited header
    #[error("no front matter block found")]
    MissingFrontMatter,

    /// Internal pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Remote store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status
    #[error("store rejected post {post_id} ({status}): {body}")]
    Rejected {
        /// Post the request was about
        post_id: PostId,
        /// Response status
        status: reqwest::StatusCode,
        /// Raw response body
        body: String,
    },

    /// The store could not be reached
    #[error("store request for post {post_id} failed: {source}")]
    Transport {
        /// Post the request was about
        post_id: PostId,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The document for the post could not be assembled
    #[error("failed to assemble document for post {post_id}: {source}")]
    Document {
        /// Post the document was for
        post_id: PostId,
        /// Assembly failure
        #[source]
        source: DocumentError,
    },

    /// HTTP client construction failed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl StoreError {
    /// Post the failed operation was about, if any
    pub fn post_id(&self) -> Option<PostId> {
        match self {
            StoreError::Rejected { post_id, .. }
            | StoreError::Transport { post_id, .. }
            | StoreError::Document { post_id, .. } => Some(*post_id),
            StoreError::Client(_) => None,
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
