//! Backward crawl of one relay.
//!
//! ```text
//! Connecting ──fail──► ConnectFailed
//!     │
//!     ▼
//! Paging (REQ until=cursor) ──fail──► SubscribeFailed
//!     │
//!     ▼
//! Draining page until EOSE
//!     │
//!     ├── cut off before EOSE ──► same until again (3 attempts) ──► Interrupted
//!     │
//!     ├── empty page ──► Exhausted
//!     │
//!     └── re-sign and publish every event, advance cursor, back to Paging
//! ```
//!
//! A page that ends without EOSE may be missing events anywhere in its time
//! range, so it is thrown away and requested again with the same `until`.
//!
//! Events are republished to the relay they were read from. Publishing is a
//! one-way send; a refused send is only counted in metrics.

use nostr_sdk::{Event, Timestamp};
use rekey_core::metrics::{
    CRAWL_FAILURES, EVENTS_FETCHED, EVENTS_PUBLISHED, EVENTS_SKIPPED, PAGES, PAGES_RETRIED,
    PUBLISH_FAILURES, increment_relay,
};
use rekey_core::{Identity, PageStep, PaginationCursor, rekey_event_now};

use crate::config::CrawlConfig;
use crate::transport::{PageQuery, RelayConnector, RelaySession, Subscription};

/// Requests per `until` before a relay that keeps cutting pages off is given up.
pub const MAX_PAGE_ATTEMPTS: usize = 3;

/// How a relay crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The relay returned an empty page.
    Exhausted,
    /// The relay could not be reached.
    ConnectFailed(String),
    /// A history request was refused; pages before it were still cloned.
    SubscribeFailed(String),
    /// Every attempt at one page ended before EOSE.
    Interrupted {
        /// Upper bound of the page that could not be fetched.
        until: Timestamp,
    },
}

/// Counters for one relay crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Relay URL.
    pub relay: String,
    /// How the crawl ended.
    pub outcome: CrawlOutcome,
    /// Non-empty pages received.
    pub pages: usize,
    /// Events received across all pages.
    pub fetched: usize,
    /// Replies dropped.
    pub skipped: usize,
    /// Re-signed events handed to the relay (or counted, in dry-run mode).
    pub sent: usize,
}

impl CrawlReport {
    fn new(relay: &str) -> Self {
        Self {
            relay: relay.to_string(),
            outcome: CrawlOutcome::Exhausted,
            pages: 0,
            fetched: 0,
            skipped: 0,
            sent: 0,
        }
    }

    /// Returns true if the relay's history was walked to the end.
    pub fn is_complete(&self) -> bool {
        self.outcome == CrawlOutcome::Exhausted
    }
}

/// Clone the source's history on `relay`.
///
/// Never fails: connection and subscription errors end the crawl and are
/// recorded in the report.
pub async fn crawl_relay<C: RelayConnector>(
    connector: &C,
    relay: &str,
    identity: &Identity,
    config: &CrawlConfig,
) -> CrawlReport {
    let mut report = CrawlReport::new(relay);

    tracing::info!("Connecting to {}", relay);
    let session = match connector.connect(relay).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Failed to connect to {}: {}", relay, e);
            metrics::counter!(CRAWL_FAILURES, "reason" => "connect").increment(1);
            report.outcome = CrawlOutcome::ConnectFailed(e.to_string());
            return report;
        }
    };
    tracing::info!("Connected to {}", relay);

    let mut cursor = PaginationCursor::starting_now();
    let mut attempts = 0;

    loop {
        tracing::debug!(
            "Requesting page {} until {}",
            cursor.pages() + 1,
            format_timestamp(cursor.until())
        );
        let query = PageQuery::history(identity.source, config.page_size, cursor.until());
        increment_relay(PAGES, relay, 1);

        let subscription = match session.subscribe(query).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!("Stopping crawl of {}: {}", relay, e);
                metrics::counter!(CRAWL_FAILURES, "reason" => "subscribe").increment(1);
                report.outcome = CrawlOutcome::SubscribeFailed(e.to_string());
                break;
            }
        };

        let Some(page) = drain_page(subscription).await else {
            attempts += 1;
            if attempts >= MAX_PAGE_ATTEMPTS {
                tracing::warn!(
                    "Stopping crawl of {}: page until {} ended before EOSE {} times",
                    relay,
                    format_timestamp(cursor.until()),
                    attempts
                );
                metrics::counter!(CRAWL_FAILURES, "reason" => "interrupted").increment(1);
                report.outcome = CrawlOutcome::Interrupted {
                    until: cursor.until(),
                };
                break;
            }
            tracing::debug!("Page from {} ended before EOSE, requesting it again", relay);
            increment_relay(PAGES_RETRIED, relay, 1);
            continue;
        };
        attempts = 0;

        increment_relay(EVENTS_FETCHED, relay, page.len() as u64);
        report.fetched += page.len();

        let step = cursor.advance(&page);

        for event in &page {
            republish(&session, event, identity, config, &mut report).await;
        }

        if step == PageStep::Exhausted {
            break;
        }
    }

    report.pages = cursor.pages();
    session.disconnect().await;

    tracing::info!(
        "Sent {} events to {} ({} pages, {} replies skipped)",
        report.sent,
        relay,
        report.pages,
        report.skipped
    );

    report
}

/// Collect one page: everything the relay sends before EOSE.
///
/// Returns `None` if the subscription ended without EOSE.
async fn drain_page(subscription: Subscription) -> Option<Vec<Event>> {
    let (mut events, watcher) = subscription.spawn_eose_watcher();

    let mut page = Vec::new();
    while let Some(event) = events.recv().await {
        page.push(event);
    }

    match watcher.await {
        Ok(true) => Some(page),
        Ok(false) => None,
        Err(e) => {
            tracing::debug!("EOSE watcher ended abnormally: {}", e);
            None
        }
    }
}

async fn republish<S: RelaySession>(
    session: &S,
    event: &Event,
    identity: &Identity,
    config: &CrawlConfig,
    report: &mut CrawlReport,
) {
    let rekeyed = match rekey_event_now(event, &identity.destination) {
        Ok(Some(rekeyed)) => rekeyed,
        Ok(None) => {
            increment_relay(EVENTS_SKIPPED, session.url(), 1);
            report.skipped += 1;
            return;
        }
        Err(e) => {
            tracing::warn!("Failed to re-sign event {}: {}", event.id, e);
            return;
        }
    };

    if config.dry_run {
        tracing::trace!("Dry run: would publish {}", rekeyed.id);
        report.sent += 1;
        return;
    }

    match session.publish(rekeyed).await {
        Ok(()) => {
            increment_relay(EVENTS_PUBLISHED, session.url(), 1);
            report.sent += 1;
        }
        Err(_) => increment_relay(PUBLISH_FAILURES, session.url(), 1),
    }
}

fn format_timestamp(timestamp: Timestamp) -> String {
    chrono::DateTime::from_timestamp(timestamp.as_u64() as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}
