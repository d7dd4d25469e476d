//! Error types for relay discovery and cloning.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to relays.
#[derive(Error, Debug)]
pub enum Error {
    /// Identity or re-signing error from the core crate.
    #[error(transparent)]
    Core(#[from] rekey_core::Error),

    /// A relay URL could not be parsed.
    #[error("invalid relay URL '{url}': {reason}")]
    InvalidRelayUrl {
        /// The URL as it was supplied.
        url: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// The websocket session to a relay could not be established.
    #[error("failed to connect to {relay}: {reason}")]
    Connect {
        /// Relay URL.
        relay: String,
        /// Transport error.
        reason: String,
    },

    /// The relay did not accept a subscription.
    #[error("failed to subscribe on {relay}: {reason}")]
    Subscribe {
        /// Relay URL.
        relay: String,
        /// Transport error or relay rejection.
        reason: String,
    },

    /// An event could not be handed to the relay connection.
    #[error("failed to publish to {relay}: {reason}")]
    Publish {
        /// Relay URL.
        relay: String,
        /// Transport error.
        reason: String,
    },
}
