//! Backward pagination over one relay's history.
//!
//! A crawl asks a relay for the newest `limit` events at or before `until`,
//! then moves `until` to one second below the oldest event it received. The
//! boundary timestamp is never requested twice, so every non-empty page
//! strictly shrinks the remaining window and a finite history always ends in
//! an empty page.

use nostr::{Event, Timestamp};

/// Result of feeding one page into the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Request the next page with the updated `until`.
    Continue,
    /// Nothing is left to request.
    Exhausted,
}

/// Tracks the `until` boundary of one relay crawl.
#[derive(Debug, Clone)]
pub struct PaginationCursor {
    until: Timestamp,
    pages: usize,
}

impl PaginationCursor {
    /// Start a cursor at `until` (normally the current time).
    pub fn new(until: Timestamp) -> Self {
        Self { until, pages: 0 }
    }

    /// Start a cursor at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Timestamp::now())
    }

    /// Upper bound for the next request.
    pub fn until(&self) -> Timestamp {
        self.until
    }

    /// Number of non-empty pages consumed so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Advance past a page of events.
    ///
    /// An empty page ends the crawl. Otherwise `until` becomes the oldest
    /// `created_at` in the page minus one, and is forced strictly below the
    /// previous bound so a relay that ignores `until` cannot stall the crawl.
    pub fn advance(&mut self, page: &[Event]) -> PageStep {
        let Some(oldest) = page.iter().map(|event| event.created_at.as_u64()).min() else {
            return PageStep::Exhausted;
        };

        self.pages += 1;

        let previous = self.until.as_u64();
        if oldest == 0 || previous == 0 {
            return PageStep::Exhausted;
        }

        let next = (oldest - 1).min(previous - 1);
        self.until = Timestamp::from(next);

        PageStep::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::{EventBuilder, Keys};

    fn events_at(keys: &Keys, timestamps: &[u64]) -> Vec<Event> {
        timestamps
            .iter()
            .map(|ts| {
                EventBuilder::text_note(format!("note at {ts}"))
                    .custom_created_at(Timestamp::from(*ts))
                    .sign_with_keys(keys)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_page_exhausts() {
        let mut cursor = PaginationCursor::new(Timestamp::from(1_000));
        assert_eq!(cursor.advance(&[]), PageStep::Exhausted);
        assert_eq!(cursor.until(), Timestamp::from(1_000));
        assert_eq!(cursor.pages(), 0);
    }

    #[test]
    fn test_until_moves_below_oldest_event() {
        let keys = Keys::generate();
        let mut cursor = PaginationCursor::new(Timestamp::from(1_000));

        // Received order is not timestamp order
        let page = events_at(&keys, &[900, 700, 950, 800]);
        assert_eq!(cursor.advance(&page), PageStep::Continue);
        assert_eq!(cursor.until(), Timestamp::from(699));
        assert_eq!(cursor.pages(), 1);
    }

    #[test]
    fn test_until_strictly_decreases_when_relay_ignores_bound() {
        let keys = Keys::generate();
        let mut cursor = PaginationCursor::new(Timestamp::from(500));

        // Events at and above the requested bound
        let page = events_at(&keys, &[500, 600]);
        assert_eq!(cursor.advance(&page), PageStep::Continue);
        assert_eq!(cursor.until(), Timestamp::from(499));
    }

    #[test]
    fn test_boundary_is_never_requested_twice() {
        let keys = Keys::generate();
        let mut cursor = PaginationCursor::new(Timestamp::from(10));
        let mut seen = vec![cursor.until()];

        for ts in [10u64, 9, 9, 5, 1] {
            if cursor.advance(&events_at(&keys, &[ts])) == PageStep::Exhausted {
                break;
            }
            assert!(cursor.until() < *seen.last().unwrap());
            seen.push(cursor.until());
        }

        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(seen, deduped);
    }

    #[test]
    fn test_starting_now_pages_below_now() {
        let keys = Keys::generate();
        let mut cursor = PaginationCursor::starting_now();
        let now = cursor.until().as_u64();

        let page = events_at(&keys, &[now - 10, now - 30]);
        assert_eq!(cursor.advance(&page), PageStep::Continue);
        assert_eq!(cursor.until(), Timestamp::from(now - 31));
    }

    #[test]
    fn test_zero_timestamp_exhausts() {
        let keys = Keys::generate();
        let mut cursor = PaginationCursor::new(Timestamp::from(100));
        assert_eq!(cursor.advance(&events_at(&keys, &[0, 50])), PageStep::Exhausted);
        assert_eq!(cursor.pages(), 1);
    }
}
