//! Source and destination identity decoding.
//!
//! Keys arrive on the command line as NIP-19 bech32 strings (`npub1...`,
//! `nsec1...`) or as 64-character hex. Bech32 input is decoded into the
//! [`Nip19`] enum and matched explicitly, so an `nprofile`, `note` or a key
//! of the wrong polarity is rejected instead of being coerced.

use nostr::nips::nip19::{FromBech32, Nip19};
use nostr::{Keys, PublicKey, SecretKey};

use crate::error::{Error, Result};

const SOURCE_FIELD: &str = "source public key";
const DESTINATION_FIELD: &str = "destination secret key";

/// The two identities involved in a clone run.
///
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Author whose history is read.
    pub source: PublicKey,
    /// Keys that re-sign and author every republished event.
    pub destination: Keys,
}

impl Identity {
    /// Decode both identities from their command-line encodings.
    pub fn from_encoded(source: &str, destination_secret: &str) -> Result<Self> {
        let source = decode_public_key(source)?;
        let destination = Keys::new(decode_secret_key(destination_secret)?);

        Ok(Self {
            source,
            destination,
        })
    }

    /// Public key of the destination identity.
    pub fn destination_public_key(&self) -> PublicKey {
        self.destination.public_key()
    }
}

/// Decode an `npub` (or hex) public key.
pub fn decode_public_key(input: &str) -> Result<PublicKey> {
    let input = input.trim();

    let public_key = if is_hex_key(input) {
        PublicKey::from_hex(input)?
    } else {
        match decode_bech32(input, SOURCE_FIELD)? {
            Nip19::Pubkey(public_key) => public_key,
            other => {
                return Err(Error::UnexpectedEntity {
                    field: SOURCE_FIELD,
                    expected: "npub",
                    found: entity_name(&other),
                });
            }
        }
    };

    // Decoding only checks length; the key must also be a curve point
    public_key.xonly()?;

    Ok(public_key)
}

/// Decode an `nsec` (or hex) secret key.
pub fn decode_secret_key(input: &str) -> Result<SecretKey> {
    let input = input.trim();

    if is_hex_key(input) {
        return Ok(SecretKey::from_hex(input)?);
    }

    match decode_bech32(input, DESTINATION_FIELD)? {
        Nip19::Secret(secret_key) => Ok(secret_key),
        other => Err(Error::UnexpectedEntity {
            field: DESTINATION_FIELD,
            expected: "nsec",
            found: entity_name(&other),
        }),
    }
}

fn decode_bech32(input: &str, field: &'static str) -> Result<Nip19> {
    Nip19::from_bech32(input).map_err(|e| Error::InvalidKey {
        field,
        reason: e.to_string(),
    })
}

fn is_hex_key(input: &str) -> bool {
    input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit())
}

fn entity_name(entity: &Nip19) -> &'static str {
    #[allow(unreachable_patterns)]
    match entity {
        Nip19::Secret(_) => "nsec",
        Nip19::Pubkey(_) => "npub",
        Nip19::Profile(_) => "nprofile",
        Nip19::EventId(_) => "note",
        Nip19::Event(_) => "nevent",
        Nip19::Coordinate(_) => "naddr",
        _ => "nip19 entity",
    }
}
