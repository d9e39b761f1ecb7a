// src/dashboard/render.rs
use std::fmt::Write;

use crate::ids::AlertRecord;
use crate::session::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Ids,
    Honeypot,
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#121212;color:#e0e0e0;margin:0}\
nav{background:#1e1e1e;padding:10px 20px;text-align:center;border-bottom:2px solid #333}\
nav a{color:#e0e0e0;text-decoration:none;padding:10px 20px;margin:0 10px;border-radius:5px}\
nav a.active{background:#bb86fc;color:#121212;font-weight:bold}\
main{max-width:1200px;margin:auto;padding:20px}\
h1{color:#bb86fc;border-bottom:2px solid #bb86fc;padding-bottom:10px;text-align:center}\
table{width:100%;border-collapse:collapse;margin-top:20px;background:#1e1e1e}\
th,td{padding:12px 15px;text-align:left;border-bottom:1px solid #333}\
th{background:#333;color:#bb86fc}\
.priority-1{color:#cf6679;font-weight:bold}.priority-2{color:#ffab40}.priority-3{color:#03dac6}\
.empty{text-align:center;color:#888;padding:40px}\
.card{background:#1e1e1e;border:1px solid #333;border-radius:8px;padding:20px;margin-bottom:25px}\
.card header{font-weight:bold;color:#bb86fc;display:flex;justify-content:space-between}\
.card header time{font-weight:normal;color:#aaa}";

/// Minimal HTML escaping for text and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(page: Page, title: &str, body: &str) -> String {
    let active = |p: Page| if p == page { " class=\"active\"" } else { "" };
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
         <title>Security Dashboard</title><style>{STYLE}</style></head><body>\
         <nav><a href=\"/\"{ids}>IDS Alerts</a><a href=\"/honeypot\"{hp}>Honeypot Logs</a></nav>\
         <main><h1>{title}</h1>{body}</main></body></html>",
        ids = active(Page::Ids),
        hp = active(Page::Honeypot),
    )
}

pub fn ids_page(alerts: &[AlertRecord]) -> String {
    let mut rows = String::new();
    for a in alerts {
        let sev = a.severity_label();
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}:{}</td><td>{}:{}</td><td>{}</td><td>{}</td>\
             <td class=\"priority-{}\">{}</td></tr>",
            escape(&a.timestamp),
            escape(&a.src_ip),
            escape(&a.src_port),
            escape(&a.dest_ip),
            escape(&a.dest_port),
            escape(&a.signature),
            escape(&a.category),
            escape(&sev),
            escape(&sev),
        );
    }
    if alerts.is_empty() {
        rows.push_str("<tr><td colspan=\"6\" class=\"empty\">No IDS alerts found.</td></tr>");
    }

    let table = format!(
        "<table><thead><tr><th>Timestamp</th><th>Source</th><th>Destination</th>\
         <th>Alert Message</th><th>Classification</th><th>Priority</th></tr></thead>\
         <tbody>{rows}</tbody></table>"
    );
    layout(Page::Ids, "Suricata IDS Alerts", &table)
}

pub fn honeypot_page(sessions: &[SessionRecord]) -> String {
    let mut cards = String::new();
    for s in sessions {
        let _ = write!(
            cards,
            "<section class=\"card\"><header><span>Session from: {}</span><time>{}</time></header>\
             <table><thead><tr><th style=\"width:25%\">Event</th><th>Details</th></tr></thead><tbody>",
            escape(s.src_ip_or_na()),
            escape(s.timestamp_or_na()),
        );
        for ev in &s.events {
            let _ = write!(cards, "<tr><td>{}</td><td>{}</td></tr>", escape(&ev.kind), escape(&ev.detail));
        }
        cards.push_str("</tbody></table></section>");
    }
    if sessions.is_empty() {
        cards.push_str("<div class=\"empty\">No honeypot logs found.</div>");
    }
    layout(Page::Honeypot, "Cowrie Honeypot Logs", &cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn empty_pages_say_so() {
        assert!(ids_page(&[]).contains("No IDS alerts found."));
        assert!(honeypot_page(&[]).contains("No honeypot logs found."));
    }

    #[test]
    fn ids_rows_carry_priority_class() {
        let alert = AlertRecord {
            timestamp: "2025-01-01 10:00:00".into(),
            src_ip: "1.2.3.4".into(),
            src_port: "4444".into(),
            dest_ip: "10.0.0.2".into(),
            dest_port: "22".into(),
            signature: "ET <SCAN>".into(),
            category: "Recon".into(),
            severity: Some(1),
        };
        let html = ids_page(&[alert]);
        assert!(html.contains("<td class=\"priority-1\">1</td>"));
        assert!(html.contains("1.2.3.4:4444"));
        assert!(html.contains("ET &lt;SCAN&gt;"));
        assert!(html.contains("<a href=\"/\" class=\"active\">"));
    }

    #[test]
    fn session_cards_render_events() {
        let session = SessionRecord {
            session_id: "A".into(),
            src_ip: Some("5.6.7.8".into()),
            first_timestamp: Some("2025-01-01 10:00:00".into()),
            events: vec![SessionEvent { kind: "command.input".into(), detail: "command: echo <x>".into() }],
            ..SessionRecord::default()
        };
        let html = honeypot_page(&[session]);
        assert!(html.contains("Session from: 5.6.7.8"));
        assert!(html.contains("<time>2025-01-01 10:00:00</time>"));
        assert!(html.contains("command: echo &lt;x&gt;"));
        assert!(html.contains("<a href=\"/honeypot\" class=\"active\">"));
    }
}
