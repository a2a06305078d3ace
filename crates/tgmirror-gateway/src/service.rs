use crate::config::Config;
use anyhow::{Context, Result};
use tgmirror_channel::MirrorService;
use tgmirror_extractor::PostExtractor;
use tgmirror_store::StoreClient;
use tokio::signal;
use tracing::{error, info};

/// Gateway service - wires the extractor, store and Telegram side together
pub struct GatewayService {
    config: Config,
}

impl GatewayService {
    /// Create a new gateway service
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the gateway service
    pub async fn run(self) -> Result<()> {
        tgmirror_logging::init_logging(&self.config.logging.level, self.config.logging.json)?;
        info!("Starting tgmirror gateway");

        info!(store = ?self.config.store, "Store config");

        let extractor =
            PostExtractor::new(&self.config.embed).context("Failed to build embed page client")?;
        let store = StoreClient::new(self.config.store.clone())
            .context("Failed to build repository client")?;
        let settings = self.config.channel_settings()?;

        let mirror = MirrorService::new(settings, extractor, store);

        // Setup signal handler for graceful shutdown
        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
            info!("Received shutdown signal");
        };

        tokio::select! {
            result = mirror.run() => {
                if let Err(e) = result {
                    error!("Mirror service error: {:#}", e);
                    return Err(e);
                }
            }
            _ = shutdown => {
                info!("Shutting down gracefully...");
            }
        }

        info!("Gateway service stopped");
        Ok(())
    }
}
