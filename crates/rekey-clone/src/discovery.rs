//! Relay discovery through the bootstrap relay.
//!
//! The source's NIP-65 relay list (kind 10002) names every relay its history
//! may live on. Discovery asks the bootstrap relay for the newest one and
//! turns its `r` tags into the [`RelaySet`] the fan-out crawls.

use nostr_sdk::{Kind, PublicKey};

use crate::Result;
use crate::relay::RelaySet;
use crate::transport::{PageQuery, RelayConnector, RelaySession};

/// Fetch the source's relay list from `bootstrap`.
///
/// Returns an empty set when the bootstrap relay has no relay list for the
/// source. Failing to connect or subscribe is an error.
pub async fn discover_relays<C: RelayConnector>(
    connector: &C,
    bootstrap: &str,
    source: &PublicKey,
) -> Result<RelaySet> {
    tracing::info!("Fetching relay list from {}", bootstrap);

    let session = connector.connect(bootstrap).await?;

    let subscription = match session.subscribe(PageQuery::relay_list(*source)).await {
        Ok(subscription) => subscription,
        Err(e) => {
            session.disconnect().await;
            return Err(e);
        }
    };

    let (mut events, watcher) = subscription.spawn_eose_watcher();

    let mut relays = None;
    while let Some(event) = events.recv().await {
        if event.kind == Kind::RelayList && event.pubkey == *source {
            relays = Some(RelaySet::from_relay_list(&event));
            break;
        }
        tracing::debug!(
            "Ignoring kind {} event {} from bootstrap relay",
            event.kind,
            event.id
        );
    }

    watcher.abort();
    session.disconnect().await;

    match relays {
        Some(relays) => {
            tracing::info!("Discovered {} relays: {}", relays.len(), relays);
            Ok(relays)
        }
        None => {
            tracing::warn!("No relay list for {} on {}", source, bootstrap);
            Ok(RelaySet::new())
        }
    }
}
