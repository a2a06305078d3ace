//! Embed page fetching and scraping
//!
//! Every public channel post has an unauthenticated HTML rendering at
//! `{link}?embed=1`. The body and media blocks of the mirrored document are
//! lifted from that page as-is.

use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tgmirror_types::{MediaFlags, MediaKind};
use tracing::debug;

/// The message text block
const MESSAGE_TEXT_SELECTOR: &str = r#"div[class*="js-message_text"]"#;
/// Photo anchors preceding the text block
const PHOTO_SELECTOR: &str = r#"a[class*="photo"]"#;
/// Generic message blocks preceding the text block (videos, albums, ...)
const MESSAGE_BLOCK_SELECTOR: &str = r#"div[class*="js-message"]"#;

/// Compiled selectors for the embed page markup
#[derive(Debug, Clone)]
pub struct EmbedSelectors {
    message_text: Selector,
    photo: Selector,
    message_block: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Pattern(format!("{css}: {e:?}")))
}

impl EmbedSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            message_text: parse_selector(MESSAGE_TEXT_SELECTOR)?,
            photo: parse_selector(PHOTO_SELECTOR)?,
            message_block: parse_selector(MESSAGE_BLOCK_SELECTOR)?,
        })
    }
}

/// A parsed embed page
pub struct EmbedPage<'a> {
    document: Html,
    selectors: &'a EmbedSelectors,
}

impl<'a> EmbedPage<'a> {
    pub fn parse(html: &str, selectors: &'a EmbedSelectors) -> Self {
        Self {
            document: Html::parse_document(html),
            selectors,
        }
    }

    /// Serialized markup of every message text block, in document order
    pub fn body_html(&self) -> String {
        self.document
            .select(&self.selectors.message_text)
            .map(|el| el.html())
            .collect()
    }

    /// Media markup for a message, `None` when no media flag is set.
    ///
    /// Each set flag contributes its own lookup, in the order photo, video,
    /// media group. Photos use the photo anchors; every other kind uses the
    /// generic message blocks.
    pub fn media_html(&self, media: &MediaFlags) -> Option<String> {
        if !media.any() {
            return None;
        }

        let html = media
            .kinds()
            .map(|kind| {
                let selector = match kind {
                    MediaKind::Photo => &self.selectors.photo,
                    MediaKind::Video | MediaKind::MediaGroup => &self.selectors.message_block,
                };
                self.preceding_text_siblings(selector)
            })
            .collect();

        Some(html)
    }

    /// Elements matching `selector` that are preceding siblings of a message
    /// text block, serialized and concatenated in document order
    fn preceding_text_siblings(&self, selector: &Selector) -> String {
        let mut wanted = HashSet::new();
        for text_block in self.document.select(&self.selectors.message_text) {
            for sibling in text_block.prev_siblings().filter_map(ElementRef::wrap) {
                if selector.matches(&sibling) {
                    wanted.insert(sibling.id());
                }
            }
        }

        self.document
            .select(selector)
            .filter(|el| wanted.contains(&el.id()))
            .map(|el| el.html())
            .collect()
    }
}

/// HTTP fetcher for embed pages
#[derive(Debug, Clone)]
pub struct EmbedFetcher {
    client: reqwest::Client,
}

impl EmbedFetcher {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ExtractError::Client)?;
        Ok(Self { client })
    }

    /// Fetch the raw embed page HTML for a post link
    pub async fn fetch(&self, link: &str) -> Result<String> {
        debug!(link, "Fetching embed page");

        let response = self
            .client
            .get(link)
            .query(&[("embed", "1")])
            .send()
            .await
            .map_err(|source| ExtractError::Fetch {
                url: link.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                url: link.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| ExtractError::Fetch {
            url: link.to_string(),
            source,
        })
    }
}
