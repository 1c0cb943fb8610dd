mod cleanup;
mod config;
mod error;
mod handlers;
mod provider;
mod sanitize;
mod server;
#[cfg(test)]
mod testing;
mod types;

use std::sync::Arc;

use log::info;

use config::Config;
use provider::gmail::GmailConnector;
use server::RelayServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env();
    info!("Gmail API base: {}", config.gmail_api_base);

    let http = reqwest::Client::builder().build()?;
    let connector = Arc::new(GmailConnector::new(http, config.gmail_api_base.clone()));

    let server = RelayServer::new(config, connector).start().await?;
    info!("Listening on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    server.stop().await
}
