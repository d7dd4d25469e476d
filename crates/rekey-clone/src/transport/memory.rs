//! In-memory relays for crawl and discovery tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nostr_sdk::Event;

use super::{PageQuery, RelayConnector, RelaySession, Subscription};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MemoryRelay {
    stored: Vec<Event>,
    fail_subscribe: bool,
    reject_publish: bool,
    interrupted_pages: usize,
    queries: Vec<PageQuery>,
    published: Vec<Event>,
}

/// A set of fake relays keyed by URL. Unknown URLs refuse connections.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryNetwork {
    relays: Arc<Mutex<HashMap<String, MemoryRelay>>>,
}

impl MemoryNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a reachable relay holding `stored`.
    pub(crate) fn add_relay(&self, url: &str, stored: Vec<Event>) {
        self.relays.lock().unwrap().insert(
            url.to_string(),
            MemoryRelay {
                stored,
                ..Default::default()
            },
        );
    }

    /// Make every `REQ` on `url` fail.
    pub(crate) fn fail_subscribe(&self, url: &str) {
        self.with_relay(url, |relay| relay.fail_subscribe = true);
    }

    /// Cut off the next `pages` pages on `url` halfway, without EOSE.
    pub(crate) fn interrupt_pages(&self, url: &str, pages: usize) {
        self.with_relay(url, |relay| relay.interrupted_pages = pages);
    }

    /// Make every `EVENT` sent to `url` fail.
    pub(crate) fn reject_publish(&self, url: &str) {
        self.with_relay(url, |relay| relay.reject_publish = true);
    }

    /// Queries received by `url`, in order.
    pub(crate) fn queries(&self, url: &str) -> Vec<PageQuery> {
        self.with_relay(url, |relay| relay.queries.clone())
    }

    /// Events published to `url`, in order.
    pub(crate) fn published(&self, url: &str) -> Vec<Event> {
        self.with_relay(url, |relay| relay.published.clone())
    }

    fn with_relay<T>(&self, url: &str, f: impl FnOnce(&mut MemoryRelay) -> T) -> T {
        let mut relays = self.relays.lock().unwrap();
        let relay = relays
            .get_mut(url)
            .unwrap_or_else(|| panic!("unknown relay {url}"));
        f(relay)
    }
}

impl RelayConnector for MemoryNetwork {
    type Session = MemorySession;

    async fn connect(&self, url: &str) -> Result<MemorySession> {
        if !self.relays.lock().unwrap().contains_key(url) {
            return Err(Error::Connect {
                relay: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(MemorySession {
            network: self.clone(),
            url: url.to_string(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct MemorySession {
    network: MemoryNetwork,
    url: String,
}

impl RelaySession for MemorySession {
    fn url(&self) -> &str {
        &self.url
    }

    async fn subscribe(&self, query: PageQuery) -> Result<Subscription> {
        let page = self.network.with_relay(&self.url, |relay| {
            relay.queries.push(query.clone());
            if relay.fail_subscribe {
                return None;
            }

            // Newest first, the way relays answer a limited REQ
            let mut matching: Vec<Event> = relay
                .stored
                .iter()
                .filter(|event| query.matches(event))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            matching.truncate(query.limit);

            let interrupted = relay.interrupted_pages > 0;
            if interrupted {
                relay.interrupted_pages -= 1;
                matching.truncate(matching.len() / 2);
            }
            Some((matching, interrupted))
        });

        let Some((page, interrupted)) = page else {
            return Err(Error::Subscribe {
                relay: self.url.clone(),
                reason: "blocked".to_string(),
            });
        };

        let (subscription, mut feed, cancelled) = Subscription::channel();
        tokio::spawn(async move {
            for event in page {
                if !feed.send(event) {
                    return;
                }
            }
            if interrupted {
                return;
            }
            feed.end_of_stored_events();
            let _ = cancelled.await;
        });

        Ok(subscription)
    }

    async fn publish(&self, event: Event) -> Result<()> {
        self.network.with_relay(&self.url, |relay| {
            if relay.reject_publish {
                return Err(Error::Publish {
                    relay: self.url.clone(),
                    reason: "connection closed".to_string(),
                });
            }
            relay.published.push(event);
            Ok(())
        })
    }

    async fn disconnect(&self) {}
}
