//! Core types and pure logic for cloning a Nostr author's history onto a new
//! identity.
//!
//! This crate provides:
//! - Identity decoding (NIP-19 bech32 or hex) into source and destination keys
//! - The reply filter and re-signing transform applied to every fetched event
//! - The backward pagination cursor that drives each relay crawl
//! - Prometheus metrics helpers
//! - Shared error types
//!
//! Nothing here touches the network; relay I/O lives in `rekey-clone`.

mod cursor;
mod error;
mod event;
mod identity;
pub mod metrics;

// ═══════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════

/// Default number of events requested per history page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

pub use cursor::{PageStep, PaginationCursor};
pub use error::{Error, Result};
pub use event::{
    CLONED_KINDS, EVENT_REFERENCE_TAG, RELAY_TAG, is_reply, rekey_event, rekey_event_now,
    relay_tag_values,
};
pub use identity::{Identity, decode_public_key, decode_secret_key};
