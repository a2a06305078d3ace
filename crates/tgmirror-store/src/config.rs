//! Remote store configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tgmirror_types::PostId;

/// Placeholder substituted with the post id in [`StoreConfig::path_template`]
pub const POST_ID_PLACEHOLDER: &str = "{post_id}";

/// Legacy positional placeholder, still accepted in path templates
const LEGACY_PLACEHOLDER: &str = "{}";

/// File-hosting API settings
#[derive(Deserialize, Clone)]
pub struct StoreConfig {
    /// Files endpoint of the repository, e.g.
    /// `https://gitlab.com/api/v4/projects/123/repository/files`
    pub base_url: String,

    /// Bearer token for the API
    pub api_token: String,

    /// Repository path of a post document
    #[serde(default = "default_path_template")]
    pub path_template: String,

    /// Branch all commits go to
    #[serde(default = "default_branch")]
    pub branch: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_path_template() -> String {
    format!("content/tgposts/{POST_ID_PLACEHOLDER}/index.md")
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            path_template: default_path_template(),
            branch: default_branch(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Repository path of the document for `post_id`
    pub fn document_path(&self, post_id: PostId) -> String {
        let id = post_id.to_string();
        self.path_template
            .replace(POST_ID_PLACEHOLDER, &id)
            .replace(LEGACY_PLACEHOLDER, &id)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("path_template", &self.path_template)
            .field("branch", &self.branch)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_path() {
        let config = StoreConfig::new("https://example.com", "token");
        assert_eq!(config.document_path(42), "content/tgposts/42/index.md");
        assert_eq!(config.branch, "master");
    }

    #[test]
    fn test_legacy_placeholder() {
        let mut config = StoreConfig::new("https://example.com", "token");
        config.path_template = "site/posts/{}.md".to_string();
        assert_eq!(config.document_path(7), "site/posts/7.md");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StoreConfig::new("https://example.com", "s3cret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
