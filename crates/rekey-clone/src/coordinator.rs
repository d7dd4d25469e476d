//! Fan-out of relay crawls.
//!
//! Every relay gets its own task in a `JoinSet`. Tasks share nothing but the
//! immutable identity and config, so a relay that hangs, errors or panics
//! only affects its own report.

use std::sync::Arc;

use rekey_core::Identity;
use rekey_core::metrics::ACTIVE_CRAWLS;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::CrawlConfig;
use crate::crawl::{CrawlReport, crawl_relay};
use crate::relay::RelaySet;
use crate::transport::RelayConnector;

/// Crawl every relay concurrently and wait for all of them.
///
/// Returns one report per finished task, sorted by relay URL. A panicked
/// task is logged and has no report.
pub async fn clone_relays<C: RelayConnector>(
    connector: Arc<C>,
    relays: &RelaySet,
    identity: Arc<Identity>,
    config: Arc<CrawlConfig>,
) -> Vec<CrawlReport> {
    let mut tasks = JoinSet::new();

    for relay in relays.iter() {
        let connector = Arc::clone(&connector);
        let identity = Arc::clone(&identity);
        let config = Arc::clone(&config);
        let relay = relay.to_string();
        let span = tracing::info_span!("relay", url = %relay);

        tasks.spawn(
            async move {
                metrics::gauge!(ACTIVE_CRAWLS).increment(1.0);
                let report = crawl_relay(connector.as_ref(), &relay, &identity, &config).await;
                metrics::gauge!(ACTIVE_CRAWLS).decrement(1.0);
                report
            }
            .instrument(span),
        );
    }

    tracing::info!("Started {} relay crawls", tasks.len());

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => tracing::error!("Relay crawl task failed: {}", e),
        }
    }

    reports.sort_by(|a, b| a.relay.cmp(&b.relay));
    reports
}
