use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use tgmirror_channel::{ChannelSettings, WebhookSettings};
use tgmirror_extractor::ExtractConfig;
use tgmirror_store::StoreConfig;
use url::Url;

/// Built-in defaults, overridden by every other layer
const DEFAULT_CONFIG: &str = r#"
[telegram]
bot_token = ""       # Set via BOT_TOKEN env var
channel_id = 0       # Set via CHANNEL_ID env var
log_chat_id = 0      # Set via LOG_CHAT_ID env var
webhook_url = ""     # Long polling when empty; set via WEBHOOK_URL env var
webhook_listen = "0.0.0.0:8443"
app_token = ""       # Webhook secret token; set via APP_TOKEN env var

[store]
base_url = ""        # Set via REPOSITORY_BASE_URL env var
api_token = ""       # Set via GITLAB_API_TOKEN env var
path_template = "content/tgposts/{post_id}/index.md"
branch = "master"
connect_timeout = 10
request_timeout = 30

[embed]
connect_timeout = 10
request_timeout = 30

[logging]
level = "info"       # trace, debug, info, warn, error
json = false
"#;

/// Deployment environment variables and the keys they override
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("BOT_TOKEN", "telegram.bot_token"),
    ("CHANNEL_ID", "telegram.channel_id"),
    ("LOG_CHAT_ID", "telegram.log_chat_id"),
    ("WEBHOOK_URL", "telegram.webhook_url"),
    ("APP_TOKEN", "telegram.app_token"),
    ("GITLAB_API_TOKEN", "store.api_token"),
    ("REPOSITORY_BASE_URL", "store.base_url"),
    ("TG_POST_FILE_PATH", "store.path_template"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub channel_id: i64,
    pub log_chat_id: i64,
    #[serde(default)]
    pub webhook_url: String,
    pub webhook_listen: String,
    #[serde(default)]
    pub app_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub store: StoreConfig,
    pub embed: ExtractConfig,
    pub logging: LoggingConfig,
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    /// Load configuration with layered approach:
    /// 1. Built-in defaults
    /// 2. Local override: ./tgmirror.toml (optional)
    /// 3. Environment variables with TGMIRROR__ prefix
    /// 4. Deployment environment variables such as BOT_TOKEN (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let builder = Self::defaults()
            .add_source(config::File::with_name("tgmirror").required(false))
            .add_source(
                config::Environment::with_prefix("TGMIRROR")
                    .separator("__")
                    .try_parsing(true),
            );
        let builder = Self::with_overrides(builder, |name| env::var(name).ok())?;

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Builder {
        config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ))
    }

    fn with_overrides(
        mut builder: Builder,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Builder> {
        for (name, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(name) {
                builder = builder.set_override(*key, value)?;
            }
        }
        Ok(builder)
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("Telegram bot token is not set. Please set the BOT_TOKEN environment variable");
        }
        if self.telegram.channel_id == 0 {
            bail!("Channel id is not set. Please set the CHANNEL_ID environment variable");
        }
        if self.telegram.log_chat_id == 0 {
            bail!("Log chat id is not set. Please set the LOG_CHAT_ID environment variable");
        }
        if self.store.base_url.is_empty() {
            bail!("Repository files URL is not set. Please set the REPOSITORY_BASE_URL environment variable");
        }
        if self.store.api_token.is_empty() {
            bail!("Repository API token is not set. Please set the GITLAB_API_TOKEN environment variable");
        }
        if !self.telegram.webhook_url.is_empty() {
            if self.telegram.app_token.is_empty() {
                bail!("Webhook mode requires a secret token. Please set the APP_TOKEN environment variable");
            }
            if !is_webhook_secret(&self.telegram.app_token) {
                bail!(
                    "APP_TOKEN is not a valid webhook secret token: \
                     use 1-256 characters from A-Z, a-z, 0-9, '_' and '-'"
                );
            }
        }
        Ok(())
    }

    /// Telegram settings for the mirror service
    pub fn channel_settings(&self) -> anyhow::Result<ChannelSettings> {
        let telegram = &self.telegram;
        let webhook = if telegram.webhook_url.is_empty() {
            None
        } else {
            let url = Url::parse(&telegram.webhook_url)
                .with_context(|| format!("Invalid webhook URL: {}", telegram.webhook_url))?;
            let listen: SocketAddr = telegram
                .webhook_listen
                .parse()
                .with_context(|| format!("Invalid webhook listen address: {}", telegram.webhook_listen))?;
            Some(WebhookSettings {
                url,
                listen,
                secret_token: Some(telegram.app_token.clone()).filter(|t| !t.is_empty()),
            })
        };

        Ok(ChannelSettings {
            bot_token: telegram.bot_token.clone(),
            channel_id: telegram.channel_id,
            log_chat_id: telegram.log_chat_id,
            webhook,
        })
    }
}

/// Telegram accepts 1-256 characters of `[A-Za-z0-9_-]` as a webhook secret
fn is_webhook_secret(token: &str) -> bool {
    (1..=256).contains(&token.len())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
