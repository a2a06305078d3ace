//! Configuration for the embed page fetcher

use serde::Deserialize;
use std::time::Duration;

/// Embed page fetch settings
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// User agent sent with embed requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("tgmirror/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ExtractConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
