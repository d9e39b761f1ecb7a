// src/session.rs
use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::DateTime;
use serde::Serialize;

use crate::event::RawEvent;
use crate::rules::{display_kind, EventKind, RuleIndex};
use crate::NOT_AVAILABLE;

/// One rendered line of a session view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub kind: String,
    pub detail: String,
}

/// Everything reconstructed about one honeypot session in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub src_ip: Option<String>,
    pub first_timestamp: Option<String>,
    pub events: Vec<SessionEvent>,
    pub commands: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub closed: bool,
}

impl SessionRecord {
    /// Created from the first classified event of a session, which alone
    /// decides the source ip and start time.
    fn open(event: &RawEvent) -> Self {
        Self {
            session_id: event.session_id.clone(),
            src_ip: event.src_ip.clone(),
            first_timestamp: event.timestamp.as_deref().map(normalize_timestamp),
            ..Self::default()
        }
    }

    pub fn src_ip_or_na(&self) -> &str {
        self.src_ip.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn timestamp_or_na(&self) -> &str {
        self.first_timestamp.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    fn apply(&mut self, kind: EventKind, event: &RawEvent) {
        let event_id = event.event_id.as_deref().unwrap_or_default();
        match kind {
            EventKind::CredentialAttempt { success } => {
                let user = event.username.as_deref().unwrap_or_default();
                let pass = event.password.as_deref().unwrap_or_default();
                self.push(event_id, format!("credential attempt: user={user}, pass={pass}"));
                if success && self.username.is_none() && self.password.is_none() {
                    self.username = event.username.clone();
                    self.password = event.password.clone();
                }
            }
            EventKind::CommandInput => {
                let input = event.input.as_deref().unwrap_or_default();
                self.push(event_id, format!("command: {input}"));
                self.commands.push(input.to_string());
            }
            EventKind::SessionClosed => self.closed = true,
            EventKind::Ignored => {}
        }
    }

    fn push(&mut self, event_id: &str, detail: String) {
        self.events.push(SessionEvent { kind: display_kind(event_id).to_string(), detail });
    }
}

/// Session id -> record for every session that saw at least one
/// classified event in the pass.
pub type SessionMap = HashMap<String, SessionRecord>;

/// Folds an ordered event stream into session records.
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    rules: RuleIndex,
}

impl SessionAggregator {
    pub fn new(rules: RuleIndex) -> Self {
        Self { rules }
    }

    pub fn aggregate<'a, I>(&self, events: I) -> SessionMap
    where
        I: IntoIterator<Item = &'a RawEvent>,
    {
        let mut sessions = SessionMap::new();
        for event in events {
            let kind = self.rules.classify(event.event_id.as_deref());
            if kind == EventKind::Ignored {
                continue;
            }
            sessions
                .entry(event.session_id.clone())
                .or_insert_with(|| SessionRecord::open(event))
                .apply(kind, event);
        }
        sessions
    }
}

/// Sessions with at least one rendered line, newest first.
pub fn display_sessions(sessions: &SessionMap) -> Vec<SessionRecord> {
    let mut list: Vec<SessionRecord> =
        sessions.values().filter(|s| !s.events.is_empty()).cloned().collect();
    list.sort_by(newest_first);
    list
}

fn newest_first(a: &SessionRecord, b: &SessionRecord) -> Ordering {
    b.timestamp_or_na()
        .cmp(a.timestamp_or_na())
        .then_with(|| a.session_id.cmp(&b.session_id))
}

/// `2025-07-06T10:00:00.123456Z` -> `2025-07-06 10:00:00`.
pub fn normalize_timestamp(ts: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.naive_local().format("%Y-%m-%d %H:%M:%S").to_string();
    }
    let spaced = ts.replacen('T', " ", 1);
    match spaced.split_once('.') {
        Some((head, _)) => head.to_string(),
        None => spaced,
    }
}
