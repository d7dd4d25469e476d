//! Clone a Nostr author's history onto a new identity.
//!
//! # Modules
//!
//! - [`discovery`] - Reads the source's relay list from a bootstrap relay
//! - [`coordinator`] - Runs one independent crawl per discovered relay
//! - [`crawl`] - Pages backwards through one relay and republishes
//! - [`transport`] - Relay session traits and the nostr-sdk implementation
//! - [`relay`] - Relay URL normalization and the relay set
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Bootstrap relay │  kind:10002 by source, limit 1
//! └────────┬────────┘
//!          │ r tags
//!          ▼
//! ┌─────────────────┐
//! │    RelaySet     │
//! └────────┬────────┘
//!          │ one task per relay
//!          ▼
//! ┌─────────────────┐
//! │   crawl_relay   │  REQ until=cursor ─► drain to EOSE ─► re-sign ─► EVENT
//! └─────────────────┘
//! ```
//!
//! Replies (events with an `e` tag) are never republished. Everything else is
//! re-signed by the destination key, stamped with the current time, and sent
//! back to the relay it came from.

pub mod config;
pub mod coordinator;
pub mod crawl;
pub mod discovery;
pub mod error;
pub mod relay;
pub mod transport;

pub use config::{Cli, CrawlConfig};
pub use coordinator::clone_relays;
pub use crawl::{CrawlOutcome, CrawlReport, crawl_relay};
pub use discovery::discover_relays;
pub use error::{Error, Result};
pub use relay::RelaySet;
pub use transport::{
    NostrConnector, PageQuery, RelayConnector, RelaySession, Subscription, install_crypto_provider,
};
