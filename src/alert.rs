// src/alert.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{error, info};

use crate::error::HoneywatchError;
use crate::geo::{Country, GeoResolver};
use crate::session::SessionRecord;

const NOT_CAPTURED: &str = "(not captured)";
const NO_COMMANDS: &str = "  - (No commands were run or captured)";

/// Generate a random alert ID.
pub fn generate_alert_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Markdown summary of a closed session.
pub fn format_session_alert(session: &SessionRecord, country: &Country) -> String {
    let commands = if session.commands.is_empty() {
        NO_COMMANDS.to_string()
    } else {
        session
            .commands
            .iter()
            .map(|cmd| format!("  - `{cmd}`"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🚨 *Honeypot Alert: Session Closed* 🚨\n\n\
         *Session ID:* `{id}`\n\
         *Attacker IP:* `{ip}`\n\
         *Country:* {country}\n\n\
         **Credentials Used:**\n\
         \x20 - *Username:* `{user}`\n\
         \x20 - *Password:* `{pass}`\n\n\
         **Commands Executed:**\n\
         {commands}",
        id = session.session_id,
        ip = session.src_ip_or_na(),
        user = session.username.as_deref().unwrap_or(NOT_CAPTURED),
        pass = session.password.as_deref().unwrap_or(NOT_CAPTURED),
    )
}

/// Outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> crate::Result<()>;
}

/// Telegram bot `sendMessage`.
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: &str, chat_id: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url = format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token);
        Ok(Self { client, url, chat_id: chat_id.to_string() })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> crate::Result<()> {
        let payload = json!({
            "chat_id":    self.chat_id,
            "text":       text,
            "parse_mode": "Markdown",
        });
        // The url carries the bot token; keep it out of error text and logs.
        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| HoneywatchError::Http(e.without_url()))?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(HoneywatchError::NotifyRejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

/// Resolves the country, formats and sends. Failures are logged only.
pub struct AlertDispatcher {
    geo: Arc<dyn GeoResolver>,
    notifier: Arc<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(geo: Arc<dyn GeoResolver>, notifier: Arc<dyn Notifier>) -> Self {
        Self { geo, notifier }
    }

    /// Returns whether the transport accepted the message.
    pub async fn dispatch(&self, session: &SessionRecord) -> bool {
        let alert_id = generate_alert_id();
        info!(
            alert_id = %alert_id,
            session_id = %session.session_id,
            "completed session, sending alert"
        );

        let country = self.geo.country(session.src_ip.as_deref()).await;
        let text = format_session_alert(session, &country);

        match self.notifier.send(&text).await {
            Ok(()) => {
                info!(
                    alert_id = %alert_id,
                    session_id = %session.session_id,
                    "alert sent"
                );
                true
            }
            Err(e) => {
                error!(
                    alert_id = %alert_id,
                    session_id = %session.session_id,
                    error = %e,
                    "alert not delivered"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn closed_session() -> SessionRecord {
        SessionRecord {
            session_id: "abc123".into(),
            src_ip: Some("1.2.3.4".into()),
            username: Some("root".into()),
            password: Some("toor".into()),
            commands: vec!["ls -la".into(), "cat /etc/passwd".into()],
            closed: true,
            ..SessionRecord::default()
        }
    }

    #[test]
    fn alert_ids_are_random() {
        let a = generate_alert_id();
        assert_eq!(a.len(), 12);
        assert_ne!(a, generate_alert_id());
    }

    #[test]
    fn message_lists_everything() {
        let msg = format_session_alert(&closed_session(), &Country::Named("Germany".into()));
        assert!(msg.contains("*Session ID:* `abc123`"));
        assert!(msg.contains("*Attacker IP:* `1.2.3.4`"));
        assert!(msg.contains("*Country:* Germany"));
        assert!(msg.contains("  - *Username:* `root`"));
        assert!(msg.contains("  - *Password:* `toor`"));
        assert!(msg.contains("  - `ls -la`\n  - `cat /etc/passwd`"));
    }

    #[test]
    fn message_placeholders() {
        let bare = SessionRecord { session_id: "x".into(), closed: true, ..SessionRecord::default() };
        let msg = format_session_alert(&bare, &Country::Private);
        assert!(msg.contains("*Attacker IP:* `N/A`"));
        assert!(msg.contains("*Country:* Internal/Private IP"));
        assert!(msg.contains("*Username:* `(not captured)`"));
        assert!(msg.contains("*Password:* `(not captured)`"));
        assert!(msg.ends_with("(No commands were run or captured)"));
    }

    struct FixedGeo;

    #[async_trait]
    impl GeoResolver for FixedGeo {
        async fn country(&self, _ip: Option<&str>) -> Country {
            Country::Named("Testland".into())
        }
    }

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, text: &str) -> crate::Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(HoneywatchError::NotifyRejected { status: 500, body: "boom".into() });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_sends_formatted_text() {
        let rec = Arc::new(Recording::default());
        let dispatcher = AlertDispatcher::new(Arc::new(FixedGeo), rec.clone());
        assert!(dispatcher.dispatch(&closed_session()).await);
        let sent = rec.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Testland"));
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_raise() {
        let rec = Arc::new(Recording { fail: true, ..Recording::default() });
        let dispatcher = AlertDispatcher::new(Arc::new(FixedGeo), rec.clone());
        assert!(!dispatcher.dispatch(&closed_session()).await);
        assert_eq!(rec.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn telegram_unreachable_is_an_error() {
        let notifier =
            TelegramNotifier::new("http://127.0.0.1:9", "t", "1", Duration::from_millis(200)).unwrap();
        assert!(matches!(notifier.send("hi").await, Err(HoneywatchError::Http(_))));
    }

    #[tokio::test]
    async fn transport_error_hides_bot_token() {
        let notifier = TelegramNotifier::new(
            "http://127.0.0.1:9",
            "123456:SECRET-TOKEN",
            "1",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = notifier.send("hi").await.unwrap_err();
        let text = err.to_string();
        assert!(!text.contains("SECRET-TOKEN"), "token leaked: {text}");
        assert!(!format!("{err:?}").contains("SECRET-TOKEN"));
    }
}
