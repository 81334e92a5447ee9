//! Portal API service entry point.

use std::sync::Arc;

use anyhow::Context;

use ecf_portal::modules::email::SmtpMailer;
use ecf_portal::modules::logger;
use ecf_portal::portal::{AppState, PortalConfig, PortalServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logger();

    let config = PortalConfig::from_env().context("failed to load configuration")?;
    let mailer = Arc::new(SmtpMailer::new(&config.smtp).context("failed to build SMTP transport")?);

    let state = AppState::new(config, mailer);
    let (server, handle) = PortalServer::start(state)
        .await
        .context("failed to start server")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    server.stop();
    let _ = handle.await;

    Ok(())
}
