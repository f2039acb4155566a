//! Day-bucketed index of calendar events.
//!
//! Invariants kept by every mutation:
//! - an episode id lives in at most one bucket, at most once
//! - each bucket is sorted by [`bucket_order`]
//! - buckets are never empty; a bucket that loses its last entry is removed

use chrono::{FixedOffset, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::calendar::event::{CalendarEvent, bucket_order};
use crate::domain::{DayKey, EpisodeId};

/// Outcome of a merge, for logging and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    /// Updated entries that changed day and left their old bucket.
    pub moved: usize,
}

impl MergeStats {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

#[derive(Debug)]
pub struct EventCache {
    offset: FixedOffset,
    buckets: BTreeMap<DayKey, Vec<CalendarEvent>>,
    /// Which bucket currently holds each episode.
    locations: HashMap<EpisodeId, DayKey>,
    last_resolved_start: Option<DayKey>,
}

impl EventCache {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            buckets: BTreeMap::new(),
            locations: HashMap::new(),
            last_resolved_start: None,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Merges a batch into the index, one event at a time.
    ///
    /// The day key is recomputed with this cache's offset so every stored
    /// entry uses the same derivation as the queries.
    pub fn upsert(&mut self, events: &[CalendarEvent]) -> MergeStats {
        let mut stats = MergeStats::default();

        for incoming in events {
            let mut event = incoming.clone();
            let key = DayKey::from_instant(event.air_time, self.offset);
            event.air_date_key = key;
            let id = event.episode_id;

            let displaced = match self.locations.get(&id).copied() {
                Some(previous) if previous != key => {
                    stats.moved += 1;
                    self.remove_from_bucket(previous, id)
                }
                _ => None,
            };

            let bucket = self.buckets.entry(key).or_default();
            if let Some(existing) = bucket.iter_mut().find(|e| e.episode_id == id) {
                existing.absorb(event);
                stats.updated += 1;
            } else if let Some(mut moved) = displaced {
                moved.absorb(event);
                bucket.push(moved);
                stats.updated += 1;
            } else {
                bucket.push(event);
                stats.inserted += 1;
            }
            bucket.sort_by(bucket_order);

            self.locations.insert(id, key);
        }

        stats
    }

    fn remove_from_bucket(&mut self, key: DayKey, id: EpisodeId) -> Option<CalendarEvent> {
        let bucket = self.buckets.get_mut(&key)?;
        let index = bucket.iter().position(|e| e.episode_id == id)?;
        let removed = bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        Some(removed)
    }

    #[must_use]
    pub fn has_event(&self, date: NaiveDate) -> bool {
        self.buckets.contains_key(&DayKey::from(date))
    }

    /// Sorted contents of the day's bucket, empty when there is none.
    #[must_use]
    pub fn get_events(&self, date: NaiveDate) -> &[CalendarEvent] {
        self.buckets
            .get(&DayKey::from(date))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Non-empty buckets with keys in `[start, end)`, in day order.
    #[must_use]
    pub fn events_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(DayKey, Vec<CalendarEvent>)> {
        if start >= end {
            return Vec::new();
        }
        self.buckets
            .range(DayKey::from(start)..DayKey::from(end))
            .map(|(key, bucket)| (*key, bucket.clone()))
            .collect()
    }

    #[must_use]
    pub fn locate(&self, id: EpisodeId) -> Option<DayKey> {
        self.locations.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub const fn last_resolved_start(&self) -> Option<DayKey> {
        self.last_resolved_start
    }

    /// Marks `start` as the resolved window. Returns `false` when it already
    /// was, meaning no fetch should be issued.
    pub fn claim_window(&mut self, start: DayKey) -> bool {
        if self.last_resolved_start == Some(start) {
            return false;
        }
        self.last_resolved_start = Some(start);
        true
    }

    /// Undoes [`claim_window`](Self::claim_window) if no other window has
    /// been claimed since.
    pub fn release_window(&mut self, start: DayKey) -> bool {
        if self.last_resolved_start == Some(start) {
            self.last_resolved_start = None;
            return true;
        }
        false
    }

    /// Drops every bucket and resets the window guard.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.locations.clear();
        self.last_resolved_start = None;
    }
}
