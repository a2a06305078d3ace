//! Post document assembly
//!
//! A post document is a YAML front matter block followed by the body HTML:
//!
//! ```text
//! ---
//! post_id: 42
//! title: ...
//! ...
//!
//! ---
//! <div class="tgme_widget_message_text js-message_text">...</div>
//! ```
//!
//! Header values go through `serde_yaml`, so arbitrary strings (quotes,
//! colons, newlines) survive a round trip.

use crate::error::DocumentError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tgmirror_types::{ExtractedPost, PostId};

/// Splits a document into its front matter and body
const FRONT_MATTER_PATTERN: &str = r"^---\n([\s\S]*?)\n---\n([\s\S]*)$";

/// Header block of a post document, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub post_id: PostId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub edit_date: Option<DateTime<Utc>>,
    pub link: String,
    /// Reserved by the site format, always empty here
    pub html: String,
    pub media_html: Option<String>,
}

impl From<&ExtractedPost> for FrontMatter {
    fn from(post: &ExtractedPost) -> Self {
        Self {
            post_id: post.post_id,
            title: post.title.clone(),
            date: post.date,
            edit_date: post.edit_date,
            link: post.link.clone(),
            html: String::new(),
            media_html: post.media_html.clone(),
        }
    }
}

/// Whether a write creates the post document or overwrites it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Create,
    Update,
}

impl StoreAction {
    pub fn for_write(is_update: bool) -> Self {
        if is_update {
            StoreAction::Update
        } else {
            StoreAction::Create
        }
    }
}

/// A serialized post document ready to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDocument {
    pub post_id: PostId,
    pub title: String,
    pub date: DateTime<Utc>,
    pub content: String,
}

impl PostDocument {
    /// Render front matter and body of `post`
    pub fn assemble(post: &ExtractedPost) -> Result<Self, DocumentError> {
        let header = serde_yaml::to_string(&FrontMatter::from(post))?;
        let content = format!("---\n{header}\n---\n{body}\n", body = post.body_html);

        Ok(Self {
            post_id: post.post_id,
            title: post.title.clone(),
            date: post.date,
            content,
        })
    }

    /// One-line commit message for writing this document
    pub fn commit_message(&self, action: StoreAction) -> String {
        let verb = match action {
            StoreAction::Create => "Create new",
            StoreAction::Update => "Update",
        };
        format!(
            "{verb} tgpost {}: [{}]: {}",
            self.post_id,
            self.date.to_rfc3339(),
            self.title
        )
    }
}

/// Commit message for removing a post document
pub fn delete_commit_message(post_id: PostId) -> String {
    format!("Delete tgpost {post_id}")
}

/// Split a document back into its front matter and body
pub fn parse_document(content: &str) -> Result<(FrontMatter, String), DocumentError> {
    let pattern = Regex::new(FRONT_MATTER_PATTERN)?;
    let captures = pattern
        .captures(content)
        .ok_or(DocumentError::MissingFrontMatter)?;

    let header = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let front_matter: FrontMatter = serde_yaml::from_str(header)?;
    let body = body.strip_suffix('\n').unwrap_or(body);

    Ok((front_matter, body.to_string()))
}
