mod config;
mod service;

use anyhow::Result;
use config::Config;
use service::GatewayService;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing tokens or chat ids
    let config = Config::load()?;

    GatewayService::new(config).run().await
}
