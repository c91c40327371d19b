//! # Presence Tracking
//!
//! Live per-user state on a page: cursor position, typing flag, last-seen.
//!
//! One record exists per `(user, page)` pair. Events are applied in the
//! order the transport delivered them (last write wins per field), with no
//! reordering by embedded timestamp. A record whose `last_seen` exceeds the
//! staleness threshold is treated as disconnected and excluded from the
//! active-collaborator query; `sweep` removes such records eagerly.
//!
//! The tracker is bounded the same way the comment cache is: past
//! `max_per_page` records on one page, the stalest record on that page is
//! evicted, so a stream of short-lived visitors cannot grow memory without
//! limit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::events::CollaborationEvent;

/// Cursor location inside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub block_id: String,

    /// Caret offset within the block.
    pub offset: usize,

    /// End of the selection when a range is selected, in block offsets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_end: Option<usize>,
}

/// Live state for one user on one page.
#[derive(Debug, Clone)]
pub struct PresenceRecord {
    pub user_id: String,
    pub page_id: String,
    pub cursor: Option<CursorPosition>,
    pub is_typing: bool,
    last_seen: Instant,
}

impl PresenceRecord {
    fn new(user_id: String, page_id: String) -> Self {
        Self {
            user_id,
            page_id,
            cursor: None,
            is_typing: false,
            last_seen: Instant::now(),
        }
    }

    /// Time since the last event from this collaborator.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

/// Tuning for [`PresenceTracker`].
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Records idle longer than this are treated as disconnected.
    pub stale_after: Duration,

    /// Maximum tracked collaborators per page; the stalest is evicted
    /// beyond this.
    pub max_per_page: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            max_per_page: 50,
        }
    }
}

/// Tracks collaborator presence across pages.
pub struct PresenceTracker {
    config: PresenceConfig,
    records: HashMap<(String, String), PresenceRecord>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::with_config(PresenceConfig::default())
    }

    pub fn with_config(config: PresenceConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
        }
    }

    /// Apply one collaboration event in arrival order.
    ///
    /// Any event for an unseen `(user, page)` pair creates the record;
    /// every event refreshes `last_seen`.
    pub fn apply(&mut self, event: &CollaborationEvent) {
        match event {
            CollaborationEvent::UserJoin { user_id, page_id } => {
                self.touch(page_id, user_id);
            }
            CollaborationEvent::UserLeave { user_id, page_id } => {
                self.records
                    .remove(&(page_id.clone(), user_id.clone()));
            }
            CollaborationEvent::CursorMove {
                user_id,
                page_id,
                cursor,
            } => {
                // Cursor moves land regardless of the typing state.
                self.touch(page_id, user_id).cursor = Some(cursor.clone());
            }
            CollaborationEvent::TypingStart { user_id, page_id } => {
                self.touch(page_id, user_id).is_typing = true;
            }
            CollaborationEvent::TypingStop { user_id, page_id } => {
                self.touch(page_id, user_id).is_typing = false;
            }
        }
    }

    /// Collaborators currently active on a page, stale records excluded.
    pub fn active_on_page(&self, page_id: &str) -> Vec<&PresenceRecord> {
        self.records
            .values()
            .filter(|record| {
                record.page_id == page_id && record.idle_for() <= self.config.stale_after
            })
            .collect()
    }

    /// Look up one collaborator's record, stale or not.
    pub fn record(&self, page_id: &str, user_id: &str) -> Option<&PresenceRecord> {
        self.records
            .get(&(page_id.to_string(), user_id.to_string()))
    }

    /// Eagerly remove records past the staleness threshold.
    pub fn sweep(&mut self) {
        let stale_after = self.config.stale_after;
        self.records
            .retain(|_, record| record.idle_for() <= stale_after);
    }

    /// Number of tracked records, stale ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn touch(&mut self, page_id: &str, user_id: &str) -> &mut PresenceRecord {
        let key = (page_id.to_string(), user_id.to_string());
        if !self.records.contains_key(&key) {
            self.make_room_on_page(page_id);
        }

        let record = self
            .records
            .entry(key)
            .or_insert_with(|| PresenceRecord::new(user_id.to_string(), page_id.to_string()));
        record.last_seen = Instant::now();
        record
    }

    /// Evict the stalest records on a page until one more fits under the
    /// per-page cap.
    fn make_room_on_page(&mut self, page_id: &str) {
        let mut on_page: Vec<(String, Instant)> = self
            .records
            .values()
            .filter(|record| record.page_id == page_id)
            .map(|record| (record.user_id.clone(), record.last_seen))
            .collect();

        if on_page.len() < self.config.max_per_page {
            return;
        }

        let excess = on_page.len() + 1 - self.config.max_per_page;
        on_page.sort_by_key(|(_, last_seen)| *last_seen);

        for (user_id, _) in on_page.into_iter().take(excess) {
            self.records.remove(&(page_id.to_string(), user_id.clone()));
            tracing::debug!(page_id, user_id = %user_id, "evicted stalest presence record");
        }
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
