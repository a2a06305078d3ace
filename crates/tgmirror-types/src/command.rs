use crate::PostId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between fields of an inline button token
const TOKEN_SEPARATOR: char = '|';

/// Commands carried by inline button payloads: `command|post_id[|...]`
///
/// The payload is the only state of the confirmation flow, so a pending
/// confirmation survives process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCommand {
    /// Ask for confirmation before deleting
    DeleteAttempt(PostId),
    /// Confirmed deletion
    Delete(PostId),
    /// Back out of a pending deletion
    DeleteCancel(PostId),
}

/// Button token parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command token")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("invalid post id '{0}'")]
    InvalidPostId(String),
}

impl PostCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PostCommand::DeleteAttempt(_) => "del_attempt",
            PostCommand::Delete(_) => "del",
            PostCommand::DeleteCancel(_) => "del_cancel",
        }
    }

    pub fn post_id(&self) -> PostId {
        match self {
            PostCommand::DeleteAttempt(id)
            | PostCommand::Delete(id)
            | PostCommand::DeleteCancel(id) => *id,
        }
    }

    /// Encode as a callback data token
    pub fn to_token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name(), TOKEN_SEPARATOR, self.post_id())
    }
}

impl FromStr for PostCommand {
    type Err = CommandParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut parts = token.split(TOKEN_SEPARATOR);
        let command = parts
            .next()
            .filter(|c| !c.is_empty())
            .ok_or(CommandParseError::Empty)?;
        let raw_id = parts.next().unwrap_or_default();

        let constructor: fn(PostId) -> PostCommand = match command {
            "del_attempt" => PostCommand::DeleteAttempt,
            "del" => PostCommand::Delete,
            "del_cancel" => PostCommand::DeleteCancel,
            other => return Err(CommandParseError::UnknownCommand(other.to_string())),
        };

        let post_id = raw_id
            .parse::<PostId>()
            .map_err(|_| CommandParseError::InvalidPostId(raw_id.to_string()))?;

        Ok(constructor(post_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(
            "del_attempt|42".parse::<PostCommand>(),
            Ok(PostCommand::DeleteAttempt(42))
        );
        assert_eq!("del|42".parse::<PostCommand>(), Ok(PostCommand::Delete(42)));
        assert_eq!(
            "del_cancel|42".parse::<PostCommand>(),
            Ok(PostCommand::DeleteCancel(42))
        );
    }

    #[test]
    fn test_trailing_fields_are_ignored() {
        assert_eq!(
            "del|7|extra|fields".parse::<PostCommand>(),
            Ok(PostCommand::Delete(7))
        );
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert_eq!("".parse::<PostCommand>(), Err(CommandParseError::Empty));
        assert_eq!(
            "attempt_to_delete|1".parse::<PostCommand>(),
            Err(CommandParseError::UnknownCommand("attempt_to_delete".to_string()))
        );
        assert_eq!(
            "del|abc".parse::<PostCommand>(),
            Err(CommandParseError::InvalidPostId("abc".to_string()))
        );
        assert_eq!(
            "del".parse::<PostCommand>(),
            Err(CommandParseError::InvalidPostId(String::new()))
        );
    }

    #[test]
    fn test_token_fits_callback_limit() {
        // Telegram caps callback data at 64 bytes
        let token = PostCommand::DeleteCancel(i32::MAX).to_token();
        assert_eq!(token, "del_cancel|2147483647");
        assert!(token.len() <= 64);
    }
}
