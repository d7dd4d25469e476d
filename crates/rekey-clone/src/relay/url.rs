//! Relay URL normalization.
//!
//! Relay lists are hand-edited and the same relay often shows up as
//! `wss://Relay.Example.com/` in one place and `wss://relay.example.com` in
//! another. Normalizing before insertion keeps the relay set free of cosmetic
//! duplicates, which would otherwise crawl and republish to one relay twice.
//!
//! # Normalization Rules
//!
//! - Trim surrounding whitespace
//! - Require a websocket scheme (wss:// or ws://)
//! - Lowercase the scheme and host, drop default ports (via `RelayUrl`)
//! - Remove trailing slashes
//! - Preserve non-default ports and paths

use nostr_sdk::RelayUrl;

use crate::{Error, Result};

/// Normalize a relay URL.
///
/// # Examples
///
/// ```ignore
/// use rekey_clone::relay::url::normalize_relay_url;
///
/// assert_eq!(
///     normalize_relay_url("wss://Relay.Example.COM/").unwrap(),
///     "wss://relay.example.com"
/// );
/// ```
pub fn normalize_relay_url(url: &str) -> Result<String> {
    let url = url.trim();

    // Quick check for websocket scheme
    if !url.starts_with("wss://") && !url.starts_with("ws://") {
        return Err(invalid(url, "URL must start with wss:// or ws://"));
    }

    let parsed = RelayUrl::parse(url).map_err(|e| invalid(url, e))?;

    let mut normalized = parsed.to_string();
    while normalized.ends_with('/') {
        normalized.pop();
    }

    Ok(normalized)
}

fn invalid(url: &str, reason: impl ToString) -> Error {
    Error::InvalidRelayUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}
