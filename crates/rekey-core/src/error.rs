//! Error types for identity decoding and event re-signing.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing identities or re-signing events.
#[derive(Error, Debug)]
pub enum Error {
    /// A key string could not be decoded as NIP-19 bech32 or hex.
    #[error("invalid {field}: {reason}")]
    InvalidKey {
        /// Which key was being decoded (e.g. "source public key").
        field: &'static str,
        /// Description of what's wrong.
        reason: String,
    },

    /// A valid NIP-19 entity was supplied where a different one was expected,
    /// e.g. an `nprofile` or `note` in place of an `nsec`.
    #[error("invalid {field}: expected {expected}, got {found}")]
    UnexpectedEntity {
        /// Which key was being decoded.
        field: &'static str,
        /// The entity the position requires.
        expected: &'static str,
        /// The entity that was decoded.
        found: &'static str,
    },

    /// Key derivation failed.
    #[error("key error: {0}")]
    Key(#[from] nostr::key::Error),

    /// Building or signing the re-keyed event failed.
    #[error("signing error: {0}")]
    Signing(#[from] nostr::event::builder::Error),

    /// I/O error (metrics listener).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Prometheus recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),
}
