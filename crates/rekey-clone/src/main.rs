//! rekey-clone: republish a Nostr author's history under a new key.
//!
//! # Usage
//!
//! ```bash
//! rekey-clone npub1... wss://purplepag.es nsec1...
//!
//! # See what would be cloned without publishing
//! rekey-clone --dry-run npub1... wss://purplepag.es nsec1...
//!
//! # Expose Prometheus metrics while the crawl runs
//! REKEY_METRICS_PORT=9090 rekey-clone npub1... wss://purplepag.es nsec1...
//! ```
//!
//! Logging is controlled with `RUST_LOG`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rekey_clone::{Cli, NostrConnector, clone_relays, discover_relays, install_crypto_provider};
use rekey_core::Identity;
use rekey_core::metrics::{init_metrics, start_metrics_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse()?)
                .add_directive("nostr_relay_pool=warn".parse()?),
        )
        .init();

    if !install_crypto_provider() {
        tracing::debug!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();

    let identity = Identity::from_encoded(&cli.source_npub, &cli.destination_nsec)
        .context("Failed to decode keys")?;
    let config = cli.crawl_config();

    tracing::info!("Configuration:");
    tracing::info!("  Source: {}", identity.source);
    tracing::info!("  Destination: {}", identity.destination_public_key());
    tracing::info!("  Bootstrap relay: {}", cli.bootstrap_relay);
    tracing::info!("  Page size: {}", config.page_size);
    tracing::info!("  Connect timeout: {:?}", config.connect_timeout);
    tracing::info!("  Dry run: {}", config.dry_run);

    if cli.metrics_port > 0 {
        let handle = init_metrics().context("Failed to install metrics recorder")?;
        start_metrics_server(cli.metrics_port, handle)
            .await
            .context("Failed to start metrics server")?;
    }

    let connector = NostrConnector::new(identity.destination.clone(), config.connect_timeout);

    let relays = discover_relays(&connector, &cli.bootstrap_relay, &identity.source)
        .await
        .with_context(|| format!("Relay discovery via {} failed", cli.bootstrap_relay))?;

    if relays.is_empty() {
        tracing::warn!("Nothing to clone: the source has no usable relay list");
        return Ok(());
    }

    let reports = clone_relays(
        Arc::new(connector),
        &relays,
        Arc::new(identity),
        Arc::new(config),
    )
    .await;

    let complete = reports.iter().filter(|r| r.is_complete()).count();
    let sent: usize = reports.iter().map(|r| r.sent).sum();
    let skipped: usize = reports.iter().map(|r| r.skipped).sum();

    tracing::info!("Summary:");
    for report in &reports {
        tracing::info!(
            "  {}: {:?}, {} pages, {} sent, {} skipped",
            report.relay,
            report.outcome,
            report.pages,
            report.sent,
            report.skipped
        );
    }
    tracing::info!(
        "Done: {} events sent, {} replies skipped, {}/{} relays complete",
        sent,
        skipped,
        complete,
        relays.len()
    );

    Ok(())
}
