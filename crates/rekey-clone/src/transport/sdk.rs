//! Live relay transport on nostr-sdk.
//!
//! Each session owns its own `Client` holding exactly one relay, so a slow or
//! failing relay never shares a pool, a notification channel or a
//! reconnection schedule with its siblings.
//!
//! # Subscriptions
//!
//! The pool's notification channel is subscribed to *before* the `REQ` is
//! sent, so no stored event can slip past. A forwarding task then routes
//! notifications for this subscription ID into the [`Subscription`] feed until
//! the consumer cancels, the relay sends `CLOSED`, or the pool shuts down, and
//! finally sends `CLOSE` to the relay.
//!
//! If the receiver lags before EOSE, some stored events are gone for good.
//! The task then drops the feed without EOSE so the page is requested again.
//!
//! # Publishing
//!
//! Events are sent as a bare `EVENT` client message. nostr-sdk's
//! `send_event` would wait for the relay's `OK`; cloning deliberately does not.

use std::time::Duration;

use nostr_sdk::prelude::*;
use rekey_core::metrics::{NOTIFICATIONS_LAGGED, increment_relay};
use tokio::sync::broadcast::error::RecvError;

use super::{PageQuery, RelayConnector, RelaySession, Subscription};
use crate::{Error, Result};

/// Install ring as the process-wide rustls provider for `wss://` relays.
///
/// Returns false if a provider was already installed.
pub fn install_crypto_provider() -> bool {
    rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
}

/// Connector for live relays.
#[derive(Debug, Clone)]
pub struct NostrConnector {
    /// Signer used for NIP-42 authentication.
    keys: Keys,
    /// How long to wait for the websocket handshake.
    connect_timeout: Duration,
}

impl NostrConnector {
    /// Create a connector that authenticates (NIP-42) as `keys`.
    ///
    /// Relays that require AUTH before accepting writes see the destination
    /// identity, which is also the author of everything published.
    pub fn new(keys: Keys, connect_timeout: Duration) -> Self {
        Self {
            keys,
            connect_timeout,
        }
    }
}

impl RelayConnector for NostrConnector {
    type Session = NostrSession;

    async fn connect(&self, url: &str) -> Result<NostrSession> {
        let relay_url = RelayUrl::parse(url).map_err(|e| Error::InvalidRelayUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder().signer(self.keys.clone()).build();
        client.automatic_authentication(true);

        client
            .add_relay(relay_url.clone())
            .await
            .map_err(|e| connect_error(url, e))?;

        client
            .try_connect_relay(relay_url.clone(), self.connect_timeout)
            .await
            .map_err(|e| connect_error(url, e))?;

        Ok(NostrSession {
            client,
            relay_url,
            url: url.to_string(),
        })
    }
}

fn connect_error(url: &str, e: impl std::fmt::Display) -> Error {
    Error::Connect {
        relay: url.to_string(),
        reason: e.to_string(),
    }
}

/// Session to one live relay.
#[derive(Clone)]
pub struct NostrSession {
    client: Client,
    relay_url: RelayUrl,
    url: String,
}

impl RelaySession for NostrSession {
    fn url(&self) -> &str {
        &self.url
    }

    async fn subscribe(&self, query: PageQuery) -> Result<Subscription> {
        let mut notifications = self.client.notifications();

        let output = self
            .client
            .subscribe_to([self.relay_url.clone()], query.to_filter(), None)
            .await
            .map_err(|e| Error::Subscribe {
                relay: self.url.clone(),
                reason: e.to_string(),
            })?;

        if output.success.is_empty() {
            return Err(Error::Subscribe {
                relay: self.url.clone(),
                reason: format!("relay rejected REQ: {:?}", output.failed),
            });
        }

        let subscription_id = output.val;
        let (subscription, mut feed, mut cancelled) = Subscription::channel();
        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            loop {
                let notification = tokio::select! {
                    _ = &mut cancelled => break,
                    notification = notifications.recv() => notification,
                };

                match notification {
                    Ok(RelayPoolNotification::Event {
                        subscription_id: id,
                        event,
                        ..
                    }) => {
                        if id == subscription_id && !feed.send(*event) {
                            break;
                        }
                    }
                    Ok(RelayPoolNotification::Message { message, .. }) => match message {
                        RelayMessage::EndOfStoredEvents(id) if *id == subscription_id => {
                            feed.end_of_stored_events();
                        }
                        RelayMessage::Closed {
                            subscription_id: id,
                            message: reason,
                        } if *id == subscription_id => {
                            tracing::debug!("{} closed subscription: {}", url, reason);
                            break;
                        }
                        _ => {}
                    },
                    Ok(RelayPoolNotification::Shutdown) => break,
                    Err(RecvError::Lagged(count)) => {
                        tracing::warn!("{}: notification receiver lagged by {}", url, count);
                        increment_relay(NOTIFICATIONS_LAGGED, &url, count);
                        if !feed.is_complete() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            client.unsubscribe(&subscription_id).await;
        });

        Ok(subscription)
    }

    async fn publish(&self, event: Event) -> Result<()> {
        self.client
            .send_msg_to([self.relay_url.clone()], ClientMessage::event(event))
            .await
            .map_err(|e| Error::Publish {
                relay: self.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.client.disconnect().await;
    }
}
