// src/lib.rs
//! Honeypot session reconstruction and alerting.
//!
//! The honeypot log is re-read from scratch on every pass: events are
//! decoded ([`event`]), classified ([`rules`]) and folded into sessions
//! ([`session`]). The watcher hands each pass to a [`tracker`] that
//! releases every closed session exactly once to the [`alert`]
//! dispatcher, while the [`dashboard`] renders the same sessions and the
//! IDS alerts ([`ids`]) on request.

pub mod alert;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod geo;
pub mod ids;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod tracker;
pub mod watcher;

pub use error::{HoneywatchError, Result};

/// Placeholder for any field a log record did not carry.
pub const NOT_AVAILABLE: &str = "N/A";

pub const F_SESSION: &str    = "session";
pub const F_EVENTID: &str    = "eventid";
pub const F_EVENT_TYPE: &str = "event_type";
pub const F_TIMESTAMP: &str  = "timestamp";
pub const F_SRC_IP: &str     = "src_ip";
pub const F_SRC_PORT: &str   = "src_port";
pub const F_DEST_IP: &str    = "dest_ip";
pub const F_DEST_PORT: &str  = "dest_port";
pub const F_USERNAME: &str   = "username";
pub const F_PASSWORD: &str   = "password";
pub const F_INPUT: &str      = "input";
