use crate::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured record derived from a channel message and its embed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPost {
    /// Origin message id for forwards, the message's own id otherwise
    pub post_id: PostId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub edit_date: Option<DateTime<Utc>>,
    pub link: String,
    /// `None` when the message has no media flag set
    pub media_html: Option<String>,
    pub body_html: String,
    pub has_fallback_title: bool,
}
