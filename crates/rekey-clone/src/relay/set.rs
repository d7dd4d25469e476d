//! The set of relays a source identity publishes to.

use std::collections::BTreeSet;
use std::fmt;

use nostr_sdk::Event;
use rekey_core::relay_tag_values;

use super::url::normalize_relay_url;

/// Deduplicated set of normalized relay URLs.
///
/// Built once from the source's relay list and read-only afterwards. Kept
/// sorted so logs and reports list relays in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySet {
    relays: BTreeSet<String>,
}

impl RelaySet {
    /// Create an empty relay set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a relay set from the `r` tags of a NIP-65 relay list event.
    ///
    /// Invalid URLs are skipped with a warning.
    pub fn from_relay_list(event: &Event) -> Self {
        let mut set = Self::new();

        for value in relay_tag_values(event) {
            match normalize_relay_url(value) {
                Ok(url) => {
                    if !set.relays.insert(url) {
                        tracing::debug!("Duplicate relay in relay list: {}", value);
                    }
                }
                Err(e) => tracing::warn!("Skipping relay list entry: {}", e),
            }
        }

        set
    }

    /// Number of relays in the set.
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Returns true if there is nothing to crawl.
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Returns true if the normalized URL is in the set.
    pub fn contains(&self, url: &str) -> bool {
        self.relays.contains(url)
    }

    /// Iterate over the relay URLs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.relays.iter().map(String::as_str)
    }
}

impl fmt::Display for RelaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, url) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{url}")?;
        }
        write!(f, "]")
    }
}

impl<S: AsRef<str>> FromIterator<S> for RelaySet {
    /// Collect URLs into a set, normalizing each one and dropping invalid ones.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let relays = iter
            .into_iter()
            .filter_map(|url| normalize_relay_url(url.as_ref()).ok())
            .collect();
        Self { relays }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_sdk::{EventBuilder, Keys, Kind, Tag};

    fn relay_list(tags: &[&[&str]]) -> Event {
        let tags = tags
            .iter()
            .map(|tag| Tag::parse(tag.iter().copied()).unwrap());
        EventBuilder::new(Kind::RelayList, "")
            .tags(tags)
            .sign_with_keys(&Keys::generate())
            .unwrap()
    }

    #[test]
    fn test_from_relay_list_collects_r_tags() {
        let event = relay_list(&[
            &["r", "wss://relay.damus.io"],
            &["r", "wss://nos.lol", "write"],
            &["r", "wss://purplepag.es", "read"],
        ]);

        let set = RelaySet::from_relay_list(&event);
        assert_eq!(set.len(), 3);
        assert!(set.contains("wss://relay.damus.io"));
        assert!(set.contains("wss://nos.lol"));
        assert!(set.contains("wss://purplepag.es"));
    }

    #[test]
    fn test_from_relay_list_dedupes_cosmetic_variants() {
        let event = relay_list(&[
            &["r", "wss://relay.damus.io"],
            &["r", "wss://relay.damus.io/"],
            &["r", "wss://Relay.Damus.IO"],
        ]);

        let set = RelaySet::from_relay_list(&event);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_relay_list_skips_invalid_and_other_tags() {
        let event = relay_list(&[
            &["r", "https://not-a-relay.example.com"],
            &["p", "wss://looks-like-a-relay.example.com"],
            &["r", "wss://nos.lol"],
        ]);

        let set = RelaySet::from_relay_list(&event);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["wss://nos.lol"]);
    }

    #[test]
    fn test_empty_relay_list() {
        let set = RelaySet::from_relay_list(&relay_list(&[]));
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "[]");
    }

    #[test]
    fn test_display_is_sorted() {
        let set: RelaySet = ["wss://nos.lol", "wss://damus.io"].into_iter().collect();
        assert_eq!(set.to_string(), "[wss://damus.io, wss://nos.lol]");
    }
}
