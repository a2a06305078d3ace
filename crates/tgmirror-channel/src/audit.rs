//! Audit trail posted to the log chat
//!
//! The log chat is observational only: a failed audit post never undoes a
//! store write. Entries of one event can be grouped into a series, which
//! appends them to one rolling message instead of posting them separately.

use futures::future::BoxFuture;
use std::sync::{Arc, OnceLock};
use teloxide::dispatching::ShutdownToken;
use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode, User};
use teloxide::utils::html;
use tgmirror_types::{ExtractedPost, PostId};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// The user behind an audited action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub full_name: String,
    pub username: Option<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            full_name: user.full_name(),
            username: user.username.clone(),
        }
    }
}

impl Actor {
    /// HTML mention of the actor with id and username
    pub fn render(&self) -> String {
        let mut info = format!(
            "<b><a href=\"tg://user?id={id}\">{name}</a></b> \
             <i>(id <a href=\"https://t.me/@id{id}\">{id}</a>)</i>",
            id = self.id,
            name = html::escape(&self.full_name),
        );
        if let Some(username) = &self.username {
            info.push_str(&format!(" @{username}"));
        }
        info
    }
}

/// Entry text, with the actor appended when known
pub fn render_entry(text: &str, actor: Option<&Actor>) -> String {
    match actor {
        Some(actor) => format!("{text}\n\nby {}", actor.render()),
        None => text.to_string(),
    }
}

/// Text of a rolling series message after appending `entry`
pub fn append_entry(previous: &str, entry: &str) -> String {
    format!("{previous}\n{entry}")
}

/// Summary line of a created post
pub fn created_summary(post: &ExtractedPost) -> String {
    summary("🆕", post)
}

/// Summary line of an updated post
pub fn updated_summary(post: &ExtractedPost) -> String {
    summary("🔃", post)
}

fn summary(marker: &str, post: &ExtractedPost) -> String {
    format!(
        "{marker} #{} <a href=\"{}\">{}</a>",
        post.post_id,
        html::escape(&post.link),
        html::escape(&post.title)
    )
}

/// Summary line of a deleted post
pub fn deleted_summary(post_id: PostId) -> String {
    format!("🗑 #{post_id}")
}

/// Operator warning for a heuristic (or missing) title
pub fn fallback_title_warning(title: &str) -> String {
    format!(
        "Set proper title!\n\nFallback title set:\n{}",
        html::escape(title)
    )
}

/// Sink for audit entries in the log chat
pub struct AuditLog {
    bot: Bot,
    chat_id: ChatId,
}

impl AuditLog {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    /// Post a silent entry
    pub async fn log(
        &self,
        text: &str,
        actor: Option<&Actor>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), teloxide::RequestError> {
        self.send(render_entry(text, actor), true, markup).await?;
        Ok(())
    }

    /// Post an entry that notifies the operators
    pub async fn error(
        &self,
        text: &str,
        actor: Option<&Actor>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), teloxide::RequestError> {
        self.send(render_entry(text, actor), false, markup).await?;
        Ok(())
    }

    /// Start a series: entries written through it share one rolling message.
    /// Entries posted directly on the log are never folded into it.
    pub fn begin_series(&self) -> AuditSeries<'_> {
        AuditSeries {
            audit: self,
            last: None,
        }
    }

    async fn send(
        &self,
        text: String,
        silent: bool,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, teloxide::RequestError> {
        let mut request = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .disable_notification(silent);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        Ok(request.await?.id)
    }

    async fn edit(
        &self,
        message_id: MessageId,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, teloxide::RequestError> {
        let mut request = self
            .bot
            .edit_message_text(self.chat_id, message_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        let edited = request.await?;
        debug!(message_id = edited.id.0, "Audit series entry appended");
        Ok(edited.id)
    }
}

/// Audit entries of a single event, appended to one message
pub struct AuditSeries<'a> {
    audit: &'a AuditLog,
    last: Option<(MessageId, String)>,
}

impl AuditSeries<'_> {
    /// Append a silent entry
    pub async fn log(
        &mut self,
        text: &str,
        actor: Option<&Actor>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), teloxide::RequestError> {
        self.append(render_entry(text, actor), true, markup).await
    }

    /// Append an entry; it notifies only when it opens the series message
    pub async fn error(
        &mut self,
        text: &str,
        actor: Option<&Actor>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), teloxide::RequestError> {
        self.append(render_entry(text, actor), false, markup).await
    }

    async fn append(
        &mut self,
        text: String,
        silent: bool,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), teloxide::RequestError> {
        let next = match &self.last {
            Some((message_id, previous)) => {
                let combined = append_entry(previous, &text);
                let id = self.audit.edit(*message_id, combined.clone(), markup).await?;
                (id, combined)
            }
            None => (self.audit.send(text.clone(), silent, markup).await?, text),
        };
        self.last = Some(next);
        Ok(())
    }
}

/// Dispatcher error handler: reports a failed update to the log chat and
/// stops the dispatcher, so the failure reaches the process exit status
pub struct AuditErrorHandler {
    audit: Arc<AuditLog>,
    shutdown: OnceLock<ShutdownToken>,
    failure: Mutex<Option<anyhow::Error>>,
}

impl AuditErrorHandler {
    pub fn new(audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new(Self {
            audit,
            shutdown: OnceLock::new(),
            failure: Mutex::new(None),
        })
    }

    /// Dispatcher to stop on the first failed update
    pub fn stop_on_failure(&self, token: ShutdownToken) {
        if self.shutdown.set(token).is_err() {
            debug!("Shutdown token already attached");
        }
    }

    /// The first failure seen, if any
    pub async fn take_failure(&self) -> Option<anyhow::Error> {
        self.failure.lock().await.take()
    }
}

impl ErrorHandler<anyhow::Error> for AuditErrorHandler {
    fn handle_error(self: Arc<Self>, error: anyhow::Error) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            error!("Update handling failed: {:#}", error);
            let text = format!("⚠️ {}", html::escape(&format!("{error:#}")));
            if let Err(e) = self.audit.error(&text, None, None).await {
                error!("Failed to report error to the log chat: {}", e);
            }

            let mut failure = self.failure.lock().await;
            if failure.is_none() {
                *failure = Some(error);
            }
            drop(failure);

            if let Some(token) = self.shutdown.get() {
                match token.shutdown() {
                    Ok(_) => info!("Stopping dispatcher after a failed update"),
                    Err(e) => debug!("Dispatcher already stopping: {}", e),
                }
            }
        })
    }
}
