use crate::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment kinds that make a post carry a media block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    MediaGroup,
}

/// Per-message attachment flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFlags {
    pub photo: bool,
    pub video: bool,
    pub media_group: bool,
}

impl MediaFlags {
    /// Set flags in their fixed probing order: photo, video, media group
    pub fn kinds(&self) -> impl Iterator<Item = MediaKind> {
        [
            (self.photo, MediaKind::Photo),
            (self.video, MediaKind::Video),
            (self.media_group, MediaKind::MediaGroup),
        ]
        .into_iter()
        .filter_map(|(set, kind)| set.then_some(kind))
    }

    pub fn any(&self) -> bool {
        self.photo || self.video || self.media_group
    }
}

/// Where a forwarded channel post originally came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardOrigin {
    /// Public link of the origin chat, e.g. `https://t.me/somechannel`
    pub chat_link: Option<String>,
    pub message_id: PostId,
    pub date: DateTime<Utc>,
}

impl ForwardOrigin {
    /// Link of the original post: chat link plus message id
    pub fn link(&self) -> Option<String> {
        self.chat_link.as_ref().map(|chat| {
            format!("{}/{}", chat.trim_end_matches('/'), self.message_id)
        })
    }
}

/// A channel message as seen by the mirror, detached from the bot API types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub message_id: PostId,
    /// Plain text, or the caption for media messages
    pub text: Option<String>,
    /// MarkdownV2 rendering of the text (or caption)
    pub markdown: Option<String>,
    pub media: MediaFlags,
    pub forward_origin: Option<ForwardOrigin>,
    pub date: DateTime<Utc>,
    pub edit_date: Option<DateTime<Utc>>,
    /// Public web link of the message itself
    pub link: Option<String>,
}

impl ChannelMessage {
    pub fn new(message_id: PostId, date: DateTime<Utc>) -> Self {
        Self {
            message_id,
            text: None,
            markdown: None,
            media: MediaFlags::default(),
            forward_origin: None,
            date,
            edit_date: None,
            link: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>, markdown: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self.markdown = Some(markdown.into());
        self
    }

    pub fn with_media(mut self, media: MediaFlags) -> Self {
        self.media = media;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_edit_date(mut self, edit_date: DateTime<Utc>) -> Self {
        self.edit_date = Some(edit_date);
        self
    }

    pub fn forwarded_from(mut self, origin: ForwardOrigin) -> Self {
        self.forward_origin = Some(origin);
        self
    }

    pub fn is_forward(&self) -> bool {
        self.forward_origin.is_some()
    }
}
