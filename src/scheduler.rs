//! Load Scheduler
//!
//! Bounded-concurrency admission for image loads. Visible slots are admitted
//! immediately while capacity remains; the rest wait in a strict FIFO queue.
//! Every completion decrements the in-flight counter and admits the queue
//! head, so no queued slot can starve.

use std::collections::VecDeque;
use std::time::Instant;

use crate::slot::SlotId;

/// Outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Capacity was available; the slot may start loading now.
    Admitted,
    /// At capacity; the slot waits in the queue.
    Queued,
}

/// A pending admission request
#[derive(Debug)]
pub struct LoadQueueEntry {
    pub slot: SlotId,
    pub enqueued_at: Instant,
}

/// FIFO admission queue with an in-flight bound.
///
/// Invariant: `0 <= in_flight <= max_concurrent` at every observable point.
/// The counter rises only on admission and falls exactly once per completed
/// load, in `complete`.
#[derive(Debug)]
pub struct LoadScheduler {
    max_concurrent: usize,
    in_flight: usize,
    queue: VecDeque<LoadQueueEntry>,
}

impl LoadScheduler {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            in_flight: 0,
            queue: VecDeque::new(),
        }
    }

    /// Ask for admission. Queued slots keep submission order.
    pub fn submit(&mut self, slot: SlotId) -> Admission {
        if self.in_flight < self.max_concurrent {
            self.in_flight += 1;
            Admission::Admitted
        } else {
            self.queue.push_back(LoadQueueEntry {
                slot,
                enqueued_at: Instant::now(),
            });
            Admission::Queued
        }
    }

    /// Record a completed load and admit the queue head, if any. Returns the
    /// newly admitted slot.
    pub fn complete(&mut self) -> Option<SlotId> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let entry = self.queue.pop_front()?;
        self.in_flight += 1;
        tracing::debug!(
            slot = entry.slot.0,
            waited_ms = entry.enqueued_at.elapsed().as_millis() as u64,
            "queued load admitted"
        );
        Some(entry.slot)
    }

    /// Drop a pending entry (slot left the document before admission).
    pub fn withdraw(&mut self, slot: SlotId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|entry| entry.slot != slot);
        self.queue.len() != before
    }

    /// Currently overlapping loads.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Slots waiting for admission.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Drop every pending entry, returning how many were dropped.
    pub fn clear_queue(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}
