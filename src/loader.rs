//! Loader
//!
//! Bookkeeping for in-flight image fetches. The host owns the actual fetch
//! primitive; this side records what was asked for, when, and until when an
//! answer still counts. The primitive offers no cancellation, so a timed-out
//! fetch is abandoned rather than cancelled, and a completion arriving after
//! its entry is gone is simply ignored.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::slot::SlotId;

/// Identity of one fetch, echoed back by the host on completion.
pub type FetchId = u64;

/// One fetch handed to the host.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: FetchId,
    pub slot: SlotId,
    pub url: String,
}

/// How the host's fetch ended.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success,
    Error(String),
}

/// Host seam for the platform image-fetch primitive. `start` begins a fetch;
/// the host reports the result later through the pipeline's completion entry
/// point.
pub trait ImageFetcher {
    fn start(&mut self, request: &FetchRequest);
}

/// Record of one in-flight load.
#[derive(Debug, Clone)]
pub struct InFlightLoad {
    pub slot: SlotId,
    pub candidate: String,
    /// Whether the candidate differs from the author-supplied source.
    pub optimized: bool,
    pub started_at: Instant,
    pub deadline: Instant,
}

/// Table of loads currently out with the host.
#[derive(Debug, Default)]
pub struct LoadTracker {
    next_id: FetchId,
    loads: HashMap<FetchId, InFlightLoad>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new load and build the request for the host.
    pub fn begin(
        &mut self,
        slot: SlotId,
        candidate: String,
        optimized: bool,
        timeout: Duration,
    ) -> FetchRequest {
        self.next_id += 1;
        let id = self.next_id;
        let started_at = Instant::now();
        self.loads.insert(
            id,
            InFlightLoad {
                slot,
                candidate: candidate.clone(),
                optimized,
                started_at,
                deadline: started_at + timeout,
            },
        );
        FetchRequest {
            id,
            slot,
            url: candidate,
        }
    }

    /// Take a load out of the table. `None` means the fetch already resolved
    /// or timed out; its completion is stale.
    pub fn finish(&mut self, id: FetchId) -> Option<InFlightLoad> {
        self.loads.remove(&id)
    }

    /// Fetches whose deadline has passed.
    pub fn expired(&self, now: Instant) -> Vec<FetchId> {
        self.loads
            .iter()
            .filter(|(_, load)| now >= load.deadline)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_finish() {
        let mut tracker = LoadTracker::new();
        let request = tracker.begin(
            SlotId(1),
            "/a.avif?q=80".to_string(),
            true,
            Duration::from_secs(10),
        );
        assert_eq!(request.url, "/a.avif?q=80");
        assert_eq!(tracker.len(), 1);

        let load = tracker.finish(request.id).unwrap();
        assert_eq!(load.slot, SlotId(1));
        assert!(load.optimized);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_double_finish_is_stale() {
        let mut tracker = LoadTracker::new();
        let request = tracker.begin(SlotId(1), "/a.jpg".to_string(), false, Duration::from_secs(10));
        assert!(tracker.finish(request.id).is_some());
        assert!(tracker.finish(request.id).is_none());
    }

    #[test]
    fn test_expiry() {
        let mut tracker = LoadTracker::new();
        let request = tracker.begin(SlotId(1), "/a.jpg".to_string(), false, Duration::from_secs(10));
        let now = Instant::now();
        assert!(tracker.expired(now).is_empty());
        let expired = tracker.expired(now + Duration::from_secs(11));
        assert_eq!(expired, vec![request.id]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut tracker = LoadTracker::new();
        let a = tracker.begin(SlotId(1), "/a.jpg".to_string(), false, Duration::from_secs(1));
        let b = tracker.begin(SlotId(2), "/b.jpg".to_string(), false, Duration::from_secs(1));
        assert_ne!(a.id, b.id);
    }
}
