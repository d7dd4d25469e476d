//! Relay URLs and the relay set.
//!
//! # Architecture
//!
//! ```text
//! relay list event (kind:10002)
//!           │  r tags
//!           ▼
//! ┌───────────────────┐
//! │normalize_relay_url│  trim, validate scheme, strip trailing slash
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │     RelaySet      │  sorted, deduplicated, read-only once built
//! └───────────────────┘
//! ```

mod set;
pub mod url;

pub use set::RelaySet;
pub use url::normalize_relay_url;
