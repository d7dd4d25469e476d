//! Event filtering and re-signing.
//!
//! Only root-level content is carried over to the destination identity: an
//! event referencing another event through an `e` tag is a reply (or a quote)
//! and is dropped. Everything else is rebuilt under the destination keys with
//! a fresh `created_at`, a recomputed ID and a new Schnorr signature.

use nostr::{Event, EventBuilder, Keys, Kind, Timestamp};

use crate::error::Result;

/// Tag name marking a reference to another event.
pub const EVENT_REFERENCE_TAG: &str = "e";

/// Tag name carrying a relay URL in NIP-65 relay lists.
pub const RELAY_TAG: &str = "r";

/// Kinds that are cloned from each relay.
pub const CLONED_KINDS: [Kind; 5] = [
    Kind::Metadata,
    Kind::TextNote,
    Kind::ContactList,
    Kind::RelayList,
    Kind::LongFormTextNote,
];

/// Returns true if the event carries at least one `e` tag.
pub fn is_reply(event: &Event) -> bool {
    event
        .tags
        .iter()
        .any(|tag| tag.as_slice().first().map(String::as_str) == Some(EVENT_REFERENCE_TAG))
}

/// Collect the values of every `r` tag, in tag order.
///
/// Tags with a name but no value are skipped.
pub fn relay_tag_values(event: &Event) -> Vec<&str> {
    event
        .tags
        .iter()
        .filter_map(|tag| match tag.as_slice() {
            [name, value, ..] if name == RELAY_TAG => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

/// Re-sign an event under `keys`, stamped with `created_at`.
///
/// Returns `Ok(None)` for replies. Kind, content and tags are copied
/// verbatim; the ID is recomputed over the new author and timestamp.
pub fn rekey_event(event: &Event, keys: &Keys, created_at: Timestamp) -> Result<Option<Event>> {
    if is_reply(event) {
        return Ok(None);
    }

    let rekeyed = EventBuilder::new(event.kind, event.content.clone())
        .tags(event.tags.iter().cloned())
        .custom_created_at(created_at)
        .sign_with_keys(keys)?;

    Ok(Some(rekeyed))
}

/// Re-sign an event stamped with the current wall-clock time.
pub fn rekey_event_now(event: &Event, keys: &Keys) -> Result<Option<Event>> {
    rekey_event(event, keys, Timestamp::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::{EventId, JsonUtil, Tag};

    fn source_event(keys: &Keys, tags: Vec<Tag>) -> Event {
        EventBuilder::new(Kind::TextNote, "gm nostr")
            .tags(tags)
            .custom_created_at(Timestamp::from(1_700_000_000))
            .sign_with_keys(keys)
            .unwrap()
    }

    #[test]
    fn test_reply_is_dropped() {
        let source = Keys::generate();
        let destination = Keys::generate();
        let event = source_event(&source, vec![Tag::event(EventId::all_zeros())]);

        assert!(is_reply(&event));
        assert!(
            rekey_event_now(&event, &destination)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_e_tag_anywhere_marks_reply() {
        let source = Keys::generate();
        let referenced = "a".repeat(64);
        let tags = vec![
            Tag::parse(["t", "nostr"]).unwrap(),
            Tag::parse(["e", referenced.as_str(), "", "root"]).unwrap(),
        ];
        assert!(is_reply(&source_event(&source, tags)));
    }

    #[test]
    fn test_similar_tag_names_are_not_replies() {
        let source = Keys::generate();
        let referenced = "a".repeat(64);
        let tags = vec![
            Tag::parse(["E", referenced.as_str()]).unwrap(),
            Tag::parse(["emoji", "wave", "https://example.com/wave.png"]).unwrap(),
        ];
        assert!(!is_reply(&source_event(&source, tags)));
    }

    #[test]
    fn test_rekeyed_event_belongs_to_destination() {
        let source = Keys::generate();
        let destination = Keys::generate();
        let hint = Tag::parse(["r", "wss://relay.example.com"]).unwrap();
        let event = source_event(&source, vec![hint.clone()]);
        let now = Timestamp::from(1_800_000_000);

        let rekeyed = rekey_event(&event, &destination, now).unwrap().unwrap();

        assert_eq!(rekeyed.pubkey, destination.public_key());
        assert_eq!(rekeyed.kind, event.kind);
        assert_eq!(rekeyed.content, event.content);
        assert_eq!(rekeyed.created_at, now);
        assert_eq!(rekeyed.tags.iter().cloned().collect::<Vec<_>>(), vec![hint]);
        assert_ne!(rekeyed.id, event.id);
        assert!(rekeyed.verify_id());
        assert!(rekeyed.verify_signature());
    }

    #[test]
    fn test_rekeyed_event_survives_json_round_trip() {
        let source = Keys::generate();
        let destination = Keys::generate();
        let event = source_event(&source, Vec::new());

        let rekeyed = rekey_event_now(&event, &destination).unwrap().unwrap();
        let parsed = Event::from_json(rekeyed.as_json()).unwrap();

        assert!(parsed.verify().is_ok());
        assert_eq!(parsed.pubkey, destination.public_key());
    }

    #[test]
    fn test_relay_tag_values() {
        let source = Keys::generate();
        let mentioned = source.public_key().to_hex();
        let event = EventBuilder::new(Kind::RelayList, "")
            .tags(vec![
                Tag::parse(["r", "wss://relay.damus.io"]).unwrap(),
                Tag::parse(["r", "wss://nos.lol", "write"]).unwrap(),
                Tag::parse(["p", mentioned.as_str()]).unwrap(),
                Tag::parse(["r"]).unwrap(),
            ])
            .sign_with_keys(&source)
            .unwrap();

        assert_eq!(
            relay_tag_values(&event),
            vec!["wss://relay.damus.io", "wss://nos.lol"]
        );
    }

    #[test]
    fn test_cloned_kinds_numbers() {
        let numbers: Vec<u16> = CLONED_KINDS.iter().map(|k| k.as_u16()).collect();
        assert_eq!(numbers, vec![0, 1, 3, 10002, 30023]);
    }
}
