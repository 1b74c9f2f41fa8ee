//! Gatehouse - connection layer for a remote server-management console
//!
//! Operator tool: performs one handshake against a domain, reports what the
//! connection offers, then tears the session down.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::{
    capability::{RoleSummary, SupportedVersions},
    config::{Args, Command},
    ConnectionManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gatehouse={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let config = args.connection_config();

    // Print startup banner
    info!("======================================");
    info!("  Gatehouse - Management Console Connections");
    info!("======================================");
    info!("Connect timeout: {:?}", config.connect_timeout);
    info!("Read timeout: {:?}", config.read_timeout);
    info!(
        "Hostname verification: {}",
        if config.disable_hostname_verification { "DISABLED" } else { "enabled" }
    );
    info!("======================================");

    let mut manager = ConnectionManager::new(config);
    if let Some(versions) = args.supported_version_list() {
        info!("Supported versions: {}", versions.join(", "));
        manager = manager.with_versions(Arc::new(SupportedVersions::new(versions)));
    }

    let (outcome, locales) = match &args.command {
        Command::Connect {
            domain_url,
            username,
            password,
        } => (manager.try_connection(domain_url, username, password).await, Vec::new()),
        Command::ConnectHeader {
            domain_url,
            authorization,
            locales,
        } => (
            manager
                .try_connection_with_header(domain_url, authorization, locales)
                .await,
            locales.clone(),
        ),
    };

    info!("Connection outcome: {}", outcome);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    let Some(id) = outcome.connection_id() else {
        warn!("No connection was established");
        std::process::exit(1);
    };

    let session = manager.require_connection(id)?;
    println!("{}", serde_json::to_string_pretty(&session.info())?);

    if let Some(message) = manager.check_user_administrator(&session, &locales).await {
        warn!("{}", message);
    }

    let descriptor = manager.capabilities_for(&session).await?;
    if let Some(summary) = descriptor.payload_as::<RoleSummary>() {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    manager.remove_connection(id);
    info!("Connection closed");

    Ok(())
}
