// src/tracker.rs
use std::collections::HashSet;

use crate::session::{SessionMap, SessionRecord};

/// Session ids already alerted on. Grows for the life of the process.
#[derive(Debug, Default)]
pub struct NotifiedSet {
    ids: HashSet<String>,
}

impl NotifiedSet {
    pub fn contains(&self, session_id: &str) -> bool {
        self.ids.contains(session_id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, session_id: &str) -> bool {
        self.ids.insert(session_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Finds sessions that closed since the last pass.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    notified: NotifiedSet,
}

impl CompletionTracker {
    pub fn new(notified: NotifiedSet) -> Self {
        Self { notified }
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Closed sessions not seen before, oldest first. Every returned id is
    /// recorded, so the same session is never returned twice.
    pub fn take_completed(&mut self, sessions: &SessionMap) -> Vec<SessionRecord> {
        let mut done: Vec<SessionRecord> = sessions
            .values()
            .filter(|s| s.closed && !self.notified.contains(&s.session_id))
            .cloned()
            .collect();
        done.sort_by(|a, b| {
            a.timestamp_or_na()
                .cmp(b.timestamp_or_na())
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        for session in &done {
            self.notified.insert(&session.session_id);
        }
        done
    }
}
