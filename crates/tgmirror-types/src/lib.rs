//! tgmirror Types - Core types for the channel mirror
//!
//! This module defines the data types shared by the extractor, the store
//! client and the Telegram dispatcher.

pub mod command;
pub mod message;
pub mod post;

pub use command::{CommandParseError, PostCommand};
pub use message::{ChannelMessage, ForwardOrigin, MediaFlags, MediaKind};
pub use post::ExtractedPost;

/// Identifier of a channel post (a Telegram message id)
pub type PostId = i32;
