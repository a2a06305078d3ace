//! Telegram side of the channel mirror
//!
//! Receives channel posts, edits and inline button presses, and drives the
//! extractor and the remote store for each of them. Updates are handled one
//! at a time, across all chats.

pub mod audit;
pub mod convert;
pub mod keyboard;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use audit::{Actor, AuditErrorHandler, AuditLog, AuditSeries};
use keyboard::{delete_attempt_keyboard, delete_confirm_keyboard};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{MessageId, MessageKind};
use teloxide::update_listeners::webhooks;
use tgmirror_extractor::PostExtractor;
use tgmirror_store::StoreClient;
use tgmirror_types::{ChannelMessage, ExtractedPost, PostCommand, PostId};
use tracing::{debug, error, info, warn};
use url::Url;

/// Webhook endpoint settings
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Public URL Telegram delivers updates to
    pub url: Url,
    /// Local address the webhook server binds
    pub listen: SocketAddr,
    /// Shared secret Telegram sends back with every update
    pub secret_token: Option<String>,
}

/// Chats and transport of the mirror bot
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub bot_token: String,
    /// Channel whose posts are mirrored
    pub channel_id: i64,
    /// Chat receiving the audit trail
    pub log_chat_id: i64,
    /// Long polling is used when unset
    pub webhook: Option<WebhookSettings>,
}

/// Everything a handler needs, shared across updates
pub struct MirrorContext {
    bot: Bot,
    extractor: PostExtractor,
    store: StoreClient,
    audit: Arc<AuditLog>,
    channel_id: ChatId,
    log_chat_id: ChatId,
}

impl MirrorContext {
    fn new(bot: Bot, settings: &ChannelSettings, extractor: PostExtractor, store: StoreClient) -> Self {
        let log_chat_id = ChatId(settings.log_chat_id);
        Self {
            audit: Arc::new(AuditLog::new(bot.clone(), log_chat_id)),
            bot,
            extractor,
            store,
            channel_id: ChatId(settings.channel_id),
            log_chat_id,
        }
    }

    /// Mirror a new or edited channel post
    async fn mirror(&self, msg: &Message, edited: bool) -> Result<()> {
        if msg.chat.id != self.channel_id {
            debug!(chat_id = msg.chat.id.0, "Ignoring post from foreign chat");
            return Ok(());
        }
        if !matches!(msg.kind, MessageKind::Common(_)) {
            debug!(message_id = msg.id.0, "Ignoring service message");
            return Ok(());
        }

        self.mirror_message(&convert::channel_message(msg), edited).await
    }

    async fn mirror_message(&self, message: &ChannelMessage, edited: bool) -> Result<()> {
        // A forward promotes an already mirrored origin post
        let is_update = edited || message.is_forward();

        let post = self
            .extractor
            .extract(message)
            .await
            .with_context(|| format!("Failed to extract post from message {}", message.message_id))?;

        let mut series = self.audit.begin_series();
        self.publish(&mut series, &post, is_update).await
    }

    async fn publish(
        &self,
        series: &mut AuditSeries<'_>,
        post: &ExtractedPost,
        is_update: bool,
    ) -> Result<()> {
        if post.has_fallback_title || post.title.is_empty() {
            warn!(post_id = post.post_id, title = %post.title, "Post has no proper title");
            self.report(
                series
                    .error(&audit::fallback_title_warning(&post.title), None, None)
                    .await,
            );
        }

        self.store.write_post(post, is_update).await?;

        let logged = if is_update {
            series.log(&audit::updated_summary(post), None, None).await
        } else {
            series
                .log(
                    &audit::created_summary(post),
                    None,
                    Some(delete_attempt_keyboard(post.post_id)),
                )
                .await
        };
        self.report(logged);
        Ok(())
    }

    /// Delete a mirrored post everywhere
    async fn delete_post(&self, post_id: PostId, actor: &Actor) -> Result<()> {
        self.store.delete(post_id).await?;
        self.bot
            .delete_message(self.channel_id, MessageId(post_id))
            .await
            .with_context(|| format!("Failed to delete channel message {post_id}"))?;

        self.report(
            self.audit
                .error(&audit::deleted_summary(post_id), Some(actor), None)
                .await,
        );
        Ok(())
    }

    /// Audit failures are logged, never propagated
    fn report(&self, result: Result<(), teloxide::RequestError>) {
        if let Err(e) = result {
            error!("Failed to post audit entry: {}", e);
        }
    }
}

/// Telegram mirror service
pub struct MirrorService {
    bot: Bot,
    context: Arc<MirrorContext>,
    webhook: Option<WebhookSettings>,
}

impl MirrorService {
    /// Create a new mirror service
    pub fn new(settings: ChannelSettings, extractor: PostExtractor, store: StoreClient) -> Self {
        let bot = Bot::new(&settings.bot_token);
        let context = MirrorContext::new(bot.clone(), &settings, extractor, store);

        info!(
            channel_id = settings.channel_id,
            log_chat_id = settings.log_chat_id,
            "Mirror service initialized"
        );
        Self {
            bot,
            context: Arc::new(context),
            webhook: settings.webhook,
        }
    }

    /// Validate the bot token by making a test API call
    pub async fn validate_token(&self) -> Result<()> {
        info!("Validating Telegram bot token...");

        match self.bot.get_me().await {
            Ok(me) => {
                info!(username = ?me.username, "Telegram bot token is valid");
                Ok(())
            }
            Err(teloxide::RequestError::Api(teloxide::ApiError::InvalidToken)) => Err(
                anyhow::anyhow!("Invalid Telegram bot token. Please check the BOT_TOKEN environment variable"),
            ),
            Err(e) => Err(anyhow::anyhow!("Failed to validate Telegram bot token: {}", e)),
        }
    }

    /// Update routing: channel posts, their edits and button presses
    fn schema() -> UpdateHandler<anyhow::Error> {
        dptree::entry()
            .branch(Update::filter_channel_post().endpoint(Self::handle_channel_post))
            .branch(Update::filter_edited_channel_post().endpoint(Self::handle_edited_channel_post))
            .branch(Update::filter_callback_query().endpoint(Self::handle_callback_query))
    }

    /// Run the service until the update source stops (this is a blocking call)
    pub async fn run(self) -> Result<()> {
        self.validate_token().await?;

        info!("Starting mirror bot...");

        let error_handler = AuditErrorHandler::new(self.context.audit.clone());
        let mut dispatcher = Dispatcher::builder(self.bot.clone(), Self::schema())
            .dependencies(dptree::deps![self.context.clone()])
            .default_handler(|update| async move {
                debug!(update = ?update.id, "Unhandled update");
            })
            .error_handler(error_handler.clone())
            // One queue for every chat: channel posts and button presses
            // never overlap
            .distribution_function(|_| Some(()))
            .build();
        error_handler.stop_on_failure(dispatcher.shutdown_token());

        match self.webhook {
            Some(webhook) => {
                info!(url = %webhook.url, listen = %webhook.listen, "Receiving updates via webhook");
                let mut options = webhooks::Options::new(webhook.listen, webhook.url);
                if let Some(secret) = webhook.secret_token {
                    options = options.secret_token(secret);
                }
                let listener = webhooks::axum(self.bot.clone(), options)
                    .await
                    .context("Failed to set up webhook")?;
                dispatcher
                    .dispatch_with_listener(
                        listener,
                        LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
                    )
                    .await;
            }
            None => {
                info!("Receiving updates via long polling");
                dispatcher.dispatch().await;
            }
        }

        match error_handler.take_failure().await {
            Some(failure) => Err(failure.context("Mirror stopped after a failed update")),
            None => Ok(()),
        }
    }

    async fn handle_channel_post(msg: Message, ctx: Arc<MirrorContext>) -> Result<()> {
        ctx.mirror(&msg, false).await
    }

    async fn handle_edited_channel_post(msg: Message, ctx: Arc<MirrorContext>) -> Result<()> {
        ctx.mirror(&msg, true).await
    }

    /// Handle inline button presses in the log chat
    async fn handle_callback_query(query: CallbackQuery, ctx: Arc<MirrorContext>) -> Result<()> {
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };

        // Unknown tokens are ignored
        let command = match data.parse::<PostCommand>() {
            Ok(command) => command,
            Err(e) => {
                debug!(data, "Ignoring button press: {}", e);
                return Ok(());
            }
        };

        let Some(message) = query.regular_message() else {
            debug!(data, "Button message is no longer accessible");
            return Ok(());
        };
        if message.chat.id != ctx.log_chat_id {
            debug!(chat_id = message.chat.id.0, "Ignoring button press outside the log chat");
            return Ok(());
        }
        let (chat_id, message_id) = (message.chat.id, message.id);

        info!(command = command.name(), post_id = command.post_id(), "Button pressed");

        match command {
            PostCommand::DeleteAttempt(post_id) => {
                ctx.bot
                    .answer_callback_query(query.id.clone())
                    .text("Confirmation required")
                    .await?;
                ctx.bot
                    .edit_message_reply_markup(chat_id, message_id)
                    .reply_markup(delete_confirm_keyboard(post_id))
                    .await?;
            }
            PostCommand::Delete(post_id) => {
                ctx.bot
                    .answer_callback_query(query.id.clone())
                    .text("Deleting...")
                    .await?;
                ctx.delete_post(post_id, &Actor::from(&query.from)).await?;
                ctx.bot
                    .edit_message_reply_markup(chat_id, message_id)
                    .await?;
            }
            PostCommand::DeleteCancel(post_id) => {
                ctx.bot
                    .answer_callback_query(query.id.clone())
                    .text("Deletion cancelled")
                    .await?;
                ctx.bot
                    .edit_message_reply_markup(chat_id, message_id)
                    .reply_markup(delete_attempt_keyboard(post_id))
                    .await?;
            }
        }

        Ok(())
    }
}
