//! Conversion of bot API messages into [`ChannelMessage`]

use teloxide::types::{Message, MessageEntity, MessageOrigin};
use teloxide::utils::render::Renderer;
use tgmirror_types::{ChannelMessage, ForwardOrigin, MediaFlags};

const TELEGRAM_WEB: &str = "https://t.me";

/// Detach a channel post from the bot API types.
///
/// The text falls back to the caption for media posts; its MarkdownV2
/// rendering is taken from the same source.
pub fn channel_message(msg: &Message) -> ChannelMessage {
    let (text, entities) = match msg.text() {
        Some(text) => (Some(text), msg.entities()),
        None => (msg.caption(), msg.caption_entities()),
    };
    let markdown = text.map(|text| render_markdown(text, entities.unwrap_or_default()));

    ChannelMessage {
        message_id: msg.id.0,
        text: text.map(str::to_string),
        markdown,
        media: MediaFlags {
            photo: msg.photo().is_some(),
            video: msg.video().is_some(),
            media_group: msg.media_group_id().is_some(),
        },
        forward_origin: forward_origin(msg),
        date: msg.date,
        edit_date: msg.edit_date().copied(),
        link: msg.url().map(|url| url.to_string()),
    }
}

fn render_markdown(text: &str, entities: &[MessageEntity]) -> String {
    Renderer::new(text, entities).as_markdown()
}

/// Origin of a post forwarded from a channel; other forwards are treated
/// as original posts
fn forward_origin(msg: &Message) -> Option<ForwardOrigin> {
    match msg.forward_origin()? {
        MessageOrigin::Channel {
            date,
            chat,
            message_id,
            ..
        } => Some(ForwardOrigin {
            chat_link: chat
                .username()
                .map(|username| format!("{TELEGRAM_WEB}/{username}")),
            message_id: message_id.0,
            date: *date,
        }),
        _ => None,
    }
}
