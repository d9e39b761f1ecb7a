// src/event.rs
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One decoded honeypot log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawEvent {
    pub session_id: String,
    pub event_id: Option<String>,
    pub timestamp: Option<String>,
    pub src_ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub input: Option<String>,
}

/// Decode one log line. Returns `None` for anything that is not a JSON
/// object carrying a non-empty session id.
pub fn decode_line(line: &str) -> Option<RawEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => extract_event(&map),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "skipping malformed line");
            None
        }
    }
}

/// Extract a RawEvent from a JSON map.
pub fn extract_event(map: &Map<String, Value>) -> Option<RawEvent> {
    let session_id = field_str(map, crate::F_SESSION).filter(|s| !s.is_empty())?;

    Some(RawEvent {
        session_id,
        event_id: field_str(map, crate::F_EVENTID),
        timestamp: field_str(map, crate::F_TIMESTAMP),
        src_ip: field_str(map, crate::F_SRC_IP),
        username: field_str(map, crate::F_USERNAME),
        password: field_str(map, crate::F_PASSWORD),
        input: field_str(map, crate::F_INPUT),
    })
}

/// String view of a scalar field; numbers and bools are stringified.
pub fn field_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read every line of a log file.
///
/// A missing file is empty input. An unreadable file is logged and also
/// treated as empty; a line that is not valid UTF-8 is skipped.
pub fn read_log_lines(path: &Path) -> Vec<String> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "log file not present");
            return Vec::new();
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                path = %path.display(),
                "permission denied reading log, run with sufficient privileges"
            );
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open log");
            return Vec::new();
        }
    };

    BufReader::new(file)
        .lines()
        .filter_map(|line| match line {
            Ok(l) => Some(l),
            Err(e) => {
                debug!(error = %e, "skipping unreadable line");
                None
            }
        })
        .collect()
}

/// Decode every usable honeypot event in a log file, in file order.
pub fn read_events(path: &Path) -> Vec<RawEvent> {
    read_log_lines(path).iter().filter_map(|l| decode_line(l)).collect()
}
