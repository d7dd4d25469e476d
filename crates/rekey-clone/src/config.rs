//! Command-line and crawl configuration.

use std::time::Duration;

use clap::Parser;
use rekey_core::DEFAULT_PAGE_SIZE;

/// Default websocket connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Clone a Nostr author's history onto a new identity.
///
/// Reads the source's relay list from the bootstrap relay, then crawls every
/// listed relay backwards in time and republishes each non-reply event to the
/// same relay, re-signed by the destination key.
#[derive(Parser, Debug, Clone)]
#[command(name = "rekey-clone")]
#[command(version)]
pub struct Cli {
    /// Source public key (npub or hex)
    pub source_npub: String,

    /// Relay to read the source's relay list (kind 10002) from
    pub bootstrap_relay: String,

    /// Destination secret key (nsec or hex)
    pub destination_nsec: String,

    /// Events requested per history page
    #[arg(long, env = "REKEY_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    pub page_size: usize,

    /// Seconds to wait for each relay connection
    #[arg(long, env = "REKEY_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Fetch and re-sign without publishing anything
    #[arg(long, env = "REKEY_DRY_RUN")]
    pub dry_run: bool,

    /// Metrics HTTP server port (0 to disable)
    #[arg(long, env = "REKEY_METRICS_PORT", default_value_t = 0)]
    pub metrics_port: u16,
}

impl Cli {
    /// Settings shared by every relay crawl.
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            page_size: self.page_size,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            dry_run: self.dry_run,
        }
    }
}

fn parse_page_size(value: &str) -> Result<usize, String> {
    let size: usize = value.parse().map_err(|e| format!("{e}"))?;
    if size == 0 {
        return Err("page size must be at least 1".to_string());
    }
    Ok(size)
}

/// Settings shared by every relay crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// `limit` of each history request.
    pub page_size: usize,
    /// Websocket connect timeout.
    pub connect_timeout: Duration,
    /// Transform and count, but never publish.
    pub dry_run: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            dry_run: false,
        }
    }
}
