//! Relay transport seam.
//!
//! Crawling only needs three things from a relay: open a session, run a
//! `REQ` that streams stored events until EOSE, and push an `EVENT` without
//! waiting for the `OK`. This module defines those operations as traits so the
//! crawl engine can run against live relays ([`NostrConnector`]) or against an
//! in-memory relay in tests.
//!
//! # Subscriptions
//!
//! A [`Subscription`] is three independent handles:
//!
//! - `events`: stored events as the relay sends them
//! - `end_of_stored_events`: fires once when the relay sends EOSE
//! - `cancel`: closes the subscription; the transport then drops its event
//!   sender, which ends the `events` stream
//!
//! Dropping the cancel handle counts as cancelling. A transport that gives up
//! on a subscription (relay `CLOSED`, dropped notifications) drops its feed
//! without signalling EOSE, so the consumer can tell a cut-off page from a
//! complete one.

mod sdk;

#[cfg(test)]
pub(crate) mod memory;

pub use sdk::{NostrConnector, install_crypto_provider};

use std::future::Future;

use nostr_sdk::{Event, Filter, Kind, PublicKey, Timestamp};
use rekey_core::CLONED_KINDS;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::Result;

/// Opens sessions to relays.
pub trait RelayConnector: Send + Sync + 'static {
    /// Session type produced by this connector.
    type Session: RelaySession;

    /// Establish a session to the relay at `url`.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An open session to one relay.
pub trait RelaySession: Send + Sync + 'static {
    /// URL of the relay this session talks to.
    fn url(&self) -> &str;

    /// Open a subscription for stored events matching `query`.
    fn subscribe(&self, query: PageQuery) -> impl Future<Output = Result<Subscription>> + Send;

    /// Send an event to the relay as a one-way message.
    ///
    /// `Ok` means the message was handed to the connection; no relay
    /// acknowledgement is awaited.
    fn publish(&self, event: Event) -> impl Future<Output = Result<()>> + Send;

    /// Close the session.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}

/// Transport-neutral description of one history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Author whose events are requested.
    pub author: PublicKey,
    /// Event kinds to include.
    pub kinds: Vec<Kind>,
    /// Maximum number of events the relay should return.
    pub limit: usize,
    /// Inclusive upper bound on `created_at`.
    pub until: Option<Timestamp>,
}

impl PageQuery {
    /// Query for the author's most recent NIP-65 relay list.
    pub fn relay_list(author: PublicKey) -> Self {
        Self {
            author,
            kinds: vec![Kind::RelayList],
            limit: 1,
            until: None,
        }
    }

    /// Query for one page of the author's clonable history.
    pub fn history(author: PublicKey, limit: usize, until: Timestamp) -> Self {
        Self {
            author,
            kinds: CLONED_KINDS.to_vec(),
            limit,
            until: Some(until),
        }
    }

    /// Convert into a NIP-01 filter.
    pub fn to_filter(&self) -> Filter {
        let filter = Filter::new()
            .author(self.author)
            .kinds(self.kinds.iter().copied())
            .limit(self.limit);

        match self.until {
            Some(until) => filter.until(until),
            None => filter,
        }
    }

    /// Returns true if a relay should return `event` for this query
    /// (ignoring `limit`).
    pub fn matches(&self, event: &Event) -> bool {
        event.pubkey == self.author
            && self.kinds.contains(&event.kind)
            && self.until.is_none_or(|until| event.created_at <= until)
    }
}

/// Receiving side of a relay subscription.
#[derive(Debug)]
pub struct Subscription {
    /// Stored events in the order the relay sent them.
    pub events: mpsc::UnboundedReceiver<Event>,
    /// Resolves when the relay signals end of stored events.
    pub end_of_stored_events: oneshot::Receiver<()>,
    /// Closes the subscription.
    pub cancel: CancelHandle,
}

/// Closes a subscription when used or dropped.
#[derive(Debug)]
pub struct CancelHandle(oneshot::Sender<()>);

impl CancelHandle {
    /// Close the subscription.
    pub fn cancel(self) {
        let _ = self.0.send(());
    }
}

/// Sending side of a subscription, held by the transport.
#[derive(Debug)]
pub struct SubscriptionFeed {
    events: mpsc::UnboundedSender<Event>,
    end_of_stored_events: Option<oneshot::Sender<()>>,
}

impl SubscriptionFeed {
    /// Forward a stored event. Returns false once the consumer is gone.
    pub fn send(&self, event: Event) -> bool {
        self.events.send(event).is_ok()
    }

    /// Returns true once end of stored events has been signalled.
    pub fn is_complete(&self) -> bool {
        self.end_of_stored_events.is_none()
    }

    /// Signal end of stored events. Later calls are ignored.
    pub fn end_of_stored_events(&mut self) {
        if let Some(tx) = self.end_of_stored_events.take() {
            let _ = tx.send(());
        }
    }
}

impl Subscription {
    /// Create a connected subscription.
    ///
    /// Returns the consumer side, the transport's feed, and a receiver that
    /// resolves (with `Ok` or `Err`) once the consumer cancels or drops its
    /// cancel handle.
    pub fn channel() -> (Self, SubscriptionFeed, oneshot::Receiver<()>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (eose_tx, eose_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        (
            Self {
                events: events_rx,
                end_of_stored_events: eose_rx,
                cancel: CancelHandle(cancel_tx),
            },
            SubscriptionFeed {
                events: events_tx,
                end_of_stored_events: Some(eose_tx),
            },
            cancel_rx,
        )
    }

    /// Spawn the EOSE watcher and return the event stream.
    ///
    /// The watcher cancels the subscription as soon as the relay signals end of
    /// stored events, which in turn closes the returned stream. It resolves to
    /// `true` if EOSE arrived and `false` if the transport gave up first.
    /// Aborting the watcher drops the cancel handle and also closes the
    /// subscription.
    pub fn spawn_eose_watcher(self) -> (mpsc::UnboundedReceiver<Event>, JoinHandle<bool>) {
        let Self {
            events,
            end_of_stored_events,
            cancel,
        } = self;

        let watcher = tokio::spawn(async move {
            let complete = end_of_stored_events.await.is_ok();
            if complete {
                cancel.cancel();
            }
            complete
        });

        (events, watcher)
    }
}
