//! Bounded event log
//!
//! Keeps the most recent events with absolute indices, so readers can page
//! with `since` across evictions.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::instruction::Event;

/// Events retained when no capacity is configured.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

/// Page size when the reader gives no limit.
pub const DEFAULT_EVENT_PAGE: usize = 100;

/// Largest page returned by one read.
pub const MAX_EVENT_PAGE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEvent {
    /// Position in the log since start-up; never reused
    pub index: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<IndexedEvent>,
    /// Pass as `since` to continue after this page
    pub next_index: u64,
    /// Oldest index still retained; older events were evicted
    pub first_index: u64,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    first_index: u64,
    capacity: usize,
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY)),
            first_index: 0,
            capacity,
        }
    }

    /// Appends `event`, evicting the oldest one when full, and returns its index.
    pub fn push(&mut self, event: Event) -> u64 {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.first_index += 1;
        }
        self.entries.push_back(event);
        self.next_index() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn first_index(&self) -> u64 {
        self.first_index
    }

    /// Index the next pushed event will get.
    pub fn next_index(&self) -> u64 {
        self.first_index + self.entries.len() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// Up to `limit` events starting at index `since`.
    ///
    /// # Arguments
    ///
    /// * `since` - First index wanted; evicted indices are skipped
    /// * `limit` - Page size, clamped to `MAX_EVENT_PAGE`
    pub fn page(&self, since: u64, limit: usize) -> EventPage {
        let start = since.clamp(self.first_index, self.next_index());
        let skip = (start - self.first_index) as usize;
        let events: Vec<IndexedEvent> = self
            .entries
            .iter()
            .skip(skip)
            .take(limit.min(MAX_EVENT_PAGE))
            .enumerate()
            .map(|(i, event)| IndexedEvent {
                index: start + i as u64,
                event: event.clone(),
            })
            .collect();
        let next_index = events.last().map_or(start, |e| e.index + 1);

        EventPage {
            events,
            next_index,
            first_index: self.first_index,
        }
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
