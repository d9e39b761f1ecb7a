// src/rules.rs
use std::collections::HashMap;

/// What a honeypot event means for session reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Login attempt; `success` decides whether credentials are kept.
    CredentialAttempt { success: bool },
    CommandInput,
    SessionClosed,
    Ignored,
}

impl EventKind {
    /// Rendered as a line in the session view.
    pub fn is_displayed(self) -> bool {
        matches!(self, EventKind::CredentialAttempt { .. } | EventKind::CommandInput)
    }
}

pub const LOGIN_SUCCESS: &str = "cowrie.login.success";
pub const LOGIN_FAILED: &str = "cowrie.login.failed";
pub const COMMAND_INPUT: &str = "cowrie.command.input";
pub const SESSION_CLOSED: &str = "cowrie.session.closed";

/// Prefix the honeypot puts on every event id.
pub const EVENT_PREFIX: &str = "cowrie.";

/// Map from event id to its classification.
#[derive(Debug, Clone)]
pub struct RuleIndex {
    table: HashMap<String, EventKind>,
}

impl Default for RuleIndex {
    fn default() -> Self {
        let mut idx = Self { table: HashMap::new() };
        idx.insert(LOGIN_SUCCESS, EventKind::CredentialAttempt { success: true });
        idx.insert(LOGIN_FAILED, EventKind::CredentialAttempt { success: false });
        idx.insert(COMMAND_INPUT, EventKind::CommandInput);
        idx.insert(SESSION_CLOSED, EventKind::SessionClosed);
        idx
    }
}

impl RuleIndex {
    pub fn insert(&mut self, event_id: &str, kind: EventKind) {
        self.table.insert(event_id.to_string(), kind);
    }

    pub fn classify(&self, event_id: Option<&str>) -> EventKind {
        event_id
            .and_then(|id| self.table.get(id))
            .copied()
            .unwrap_or(EventKind::Ignored)
    }
}

/// Event id as shown to operators: `cowrie.login.success` -> `login.success`.
pub fn display_kind(event_id: &str) -> &str {
    event_id.strip_prefix(EVENT_PREFIX).unwrap_or(event_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let idx = RuleIndex::default();
        assert_eq!(idx.classify(Some(LOGIN_SUCCESS)), EventKind::CredentialAttempt { success: true });
        assert_eq!(idx.classify(Some(LOGIN_FAILED)), EventKind::CredentialAttempt { success: false });
        assert_eq!(idx.classify(Some(COMMAND_INPUT)), EventKind::CommandInput);
        assert_eq!(idx.classify(Some(SESSION_CLOSED)), EventKind::SessionClosed);
        assert_eq!(idx.classify(Some("cowrie.client.version")), EventKind::Ignored);
        assert_eq!(idx.classify(None), EventKind::Ignored);
    }

    #[test]
    fn closed_is_not_displayed() {
        assert!(!EventKind::SessionClosed.is_displayed());
        assert!(!EventKind::Ignored.is_displayed());
        assert!(EventKind::CommandInput.is_displayed());
    }

    #[test]
    fn extra_event_types_plug_in() {
        let mut idx = RuleIndex::default();
        idx.insert("cowrie.command.failed", EventKind::CommandInput);
        assert_eq!(idx.classify(Some("cowrie.command.failed")), EventKind::CommandInput);
    }

    #[test]
    fn prefix_is_stripped_for_display() {
        assert_eq!(display_kind("cowrie.login.failed"), "login.failed");
        assert_eq!(display_kind("other"), "other");
    }
}
