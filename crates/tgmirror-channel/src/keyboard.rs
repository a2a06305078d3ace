//! Inline keyboards of the delete confirmation flow

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tgmirror_types::{PostCommand, PostId};

pub const DELETE_LABEL: &str = "🗑 Удалить";
pub const CANCEL_LABEL: &str = "❌ Отмена";

/// Single button that asks for deletion
pub fn delete_attempt_keyboard(post_id: PostId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[button(DELETE_LABEL, PostCommand::DeleteAttempt(post_id))]])
}

/// Confirm and cancel buttons for a pending deletion
pub fn delete_confirm_keyboard(post_id: PostId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        button(DELETE_LABEL, PostCommand::Delete(post_id)),
        button(CANCEL_LABEL, PostCommand::DeleteCancel(post_id)),
    ]])
}

fn button(label: &str, command: PostCommand) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, command.to_token())
}
