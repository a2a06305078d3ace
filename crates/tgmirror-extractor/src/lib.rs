//! Post extraction for the channel mirror
//!
//! Turns a [`ChannelMessage`] into an [`ExtractedPost`]: canonical identity
//! (resolving forwards to their origin post), title, and the body and media
//! markup scraped from the message's public embed page.

pub mod config;
pub mod embed;
pub mod error;
pub mod title;

pub use config::ExtractConfig;
pub use embed::{EmbedFetcher, EmbedPage, EmbedSelectors};
pub use error::ExtractError;
pub use title::{Title, TitleParser};

use chrono::{DateTime, Utc};
use error::Result;
use tgmirror_types::{ChannelMessage, ExtractedPost, MediaFlags, PostId};
use tracing::{debug, info};

/// Identity fields of a post, derived without any network access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostIdentity {
    pub post_id: PostId,
    pub date: DateTime<Utc>,
    /// For forwards the forward itself counts as an edit
    pub edit_date: Option<DateTime<Utc>>,
    pub link: Option<String>,
}

impl PostIdentity {
    pub fn of(message: &ChannelMessage) -> Self {
        match &message.forward_origin {
            Some(origin) => Self {
                post_id: origin.message_id,
                date: origin.date,
                edit_date: Some(message.date),
                link: origin.link(),
            },
            None => Self {
                post_id: message.message_id,
                date: message.date,
                edit_date: message.edit_date,
                link: message.link.clone(),
            },
        }
    }
}

/// Builds [`ExtractedPost`] records from channel messages
#[derive(Debug, Clone)]
pub struct PostExtractor {
    fetcher: EmbedFetcher,
    selectors: EmbedSelectors,
    titles: TitleParser,
}

impl PostExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            fetcher: EmbedFetcher::new(config)?,
            selectors: EmbedSelectors::new()?,
            titles: TitleParser::new()?,
        })
    }

    /// Resolve the title of a message from its markdown and plain text
    pub fn title(&self, message: &ChannelMessage) -> Title {
        self.titles.parse(
            message.markdown.as_deref().unwrap_or_default(),
            message.text.as_deref().unwrap_or_default(),
        )
    }

    /// Extract a post. The embed page is fetched exactly once.
    pub async fn extract(&self, message: &ChannelMessage) -> Result<ExtractedPost> {
        let identity = PostIdentity::of(message);
        let link = identity.link.clone().ok_or(ExtractError::MissingLink {
            message_id: message.message_id,
        })?;

        let title = self.title(message);
        let page_html = self.fetcher.fetch(&link).await?;
        let (body_html, media_html) = self.scrape(&page_html, &message.media);

        info!(
            post_id = identity.post_id,
            link = %link,
            fallback_title = title.is_fallback,
            "Extracted post"
        );

        Ok(ExtractedPost {
            post_id: identity.post_id,
            title: title.text,
            date: identity.date,
            edit_date: identity.edit_date,
            link,
            media_html,
            body_html,
            has_fallback_title: title.is_fallback,
        })
    }

    /// Body and media markup of an already fetched embed page
    pub fn scrape(&self, page_html: &str, media: &MediaFlags) -> (String, Option<String>) {
        let page = EmbedPage::parse(page_html, &self.selectors);
        let body_html = page.body_html();
        let media_html = page.media_html(media);
        debug!(
            body_len = body_html.len(),
            media_len = media_html.as_ref().map(String::len),
            "Scraped embed page"
        );
        (body_html, media_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tgmirror_types::ForwardOrigin;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_identity_of_own_post() {
        let message = ChannelMessage::new(10, at(100))
            .with_edit_date(at(200))
            .with_link("https://t.me/chan/10");

        let identity = PostIdentity::of(&message);
        assert_eq!(identity.post_id, 10);
        assert_eq!(identity.date, at(100));
        assert_eq!(identity.edit_date, Some(at(200)));
        assert_eq!(identity.link.as_deref(), Some("https://t.me/chan/10"));
    }

    #[test]
    fn test_identity_of_forward_uses_origin() {
        let message = ChannelMessage::new(99, at(500))
            .with_edit_date(at(600))
            .with_link("https://t.me/mirror/99")
            .forwarded_from(ForwardOrigin {
                chat_link: Some("https://t.me/chan".to_string()),
                message_id: 10,
                date: at(100),
            });

        let identity = PostIdentity::of(&message);
        assert_eq!(identity.post_id, 10);
        assert_eq!(identity.date, at(100));
        assert_eq!(identity.edit_date, Some(at(500)));
        assert_eq!(identity.link.as_deref(), Some("https://t.me/chan/10"));
    }

    #[test]
    fn test_title_prefers_text_markdown() {
        let extractor = PostExtractor::new(&ExtractConfig::default()).unwrap();
        let message = ChannelMessage::new(1, at(0)).with_text("Heading rest", "*Heading* rest");

        let title = extractor.title(&message);
        assert_eq!(title.text, "Heading");
        assert!(!title.is_fallback);
    }

    #[tokio::test]
    async fn test_extract_without_link_fails() {
        let extractor = PostExtractor::new(&ExtractConfig::default()).unwrap();
        let message = ChannelMessage::new(3, at(0)).with_text("t", "t");

        let err = extractor.extract(&message).await.unwrap_err();
        assert!(matches!(err, ExtractError::MissingLink { message_id: 3 }));
        assert!(!err.is_retryable());
    }
}
