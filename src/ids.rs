// src/ids.rs
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::event::{field_str, read_log_lines};
use crate::NOT_AVAILABLE;

/// One Suricata alert, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRecord {
    pub timestamp: String,
    pub src_ip: String,
    pub src_port: String,
    pub dest_ip: String,
    pub dest_port: String,
    pub signature: String,
    pub category: String,
    /// 1 is the most severe.
    pub severity: Option<u8>,
}

impl AlertRecord {
    pub fn severity_label(&self) -> String {
        self.severity.map(|s| s.to_string()).unwrap_or_else(|| NOT_AVAILABLE.into())
    }
}

/// Decode one eve.json line, keeping only `event_type == "alert"`.
pub fn decode_alert(line: &str) -> Option<AlertRecord> {
    match serde_json::from_str::<Value>(line.trim()) {
        Ok(Value::Object(map)) => extract_alert(&map),
        _ => None,
    }
}

pub fn extract_alert(map: &Map<String, Value>) -> Option<AlertRecord> {
    if map.get(crate::F_EVENT_TYPE).and_then(Value::as_str) != Some("alert") {
        return None;
    }
    let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.into());
    let detail = map.get("alert").and_then(Value::as_object);
    let detail_str = |key: &str| or_na(detail.and_then(|d| field_str(d, key)));

    Some(AlertRecord {
        timestamp: or_na(field_str(map, crate::F_TIMESTAMP)).replace('T', " "),
        src_ip: or_na(field_str(map, crate::F_SRC_IP)),
        src_port: or_na(field_str(map, crate::F_SRC_PORT)),
        dest_ip: or_na(field_str(map, crate::F_DEST_IP)),
        dest_port: or_na(field_str(map, crate::F_DEST_PORT)),
        signature: detail_str("signature"),
        category: detail_str("category"),
        severity: detail
            .and_then(|d| d.get("severity"))
            .and_then(Value::as_u64)
            .and_then(|s| u8::try_from(s).ok()),
    })
}

/// All alerts in the log, newest first. A missing file is no alerts.
pub fn parse_ids_log(path: &Path) -> Vec<AlertRecord> {
    let mut alerts: Vec<AlertRecord> =
        read_log_lines(path).iter().filter_map(|l| decode_alert(l)).collect();
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    alerts
}
