// src/dashboard/auth.rs
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::DashboardState;

pub const REALM_CHALLENGE: &str = "Basic realm=\"Login Required\"";
const DENIED_BODY: &str = "Could not verify your access level.";

/// Decides whether a username/password pair may view the dashboard.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A single configured account. Only a digest of the password is kept.
pub struct StaticCredentials {
    username: String,
    password_digest: [u8; 32],
}

impl StaticCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self { username: username.to_string(), password_digest: digest(password) }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let pass_ok = digest(password) == self.password_digest;
        let user_ok = username == self.username;
        user_ok & pass_ok
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

/// Pull `user:pass` out of an `Authorization: Basic ...` header value.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn require_auth(State(state): State<DashboardState>, req: Request, next: Next) -> Response {
    let creds = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic);

    match creds {
        Some((user, pass)) if state.verifier.verify(&user, &pass) => next.run(req).await,
        _ => {
            debug!(path = %req.uri().path(), "rejected dashboard request");
            challenge()
        }
    }
}

pub fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM_CHALLENGE)],
        DENIED_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    #[test]
    fn verifies_exact_pair() {
        let creds = StaticCredentials::new("admin", "s3cret");
        assert!(creds.verify("admin", "s3cret"));
        assert!(!creds.verify("admin", "S3cret"));
        assert!(!creds.verify("root", "s3cret"));
    }

    #[test]
    fn parses_basic_header() {
        let value = format!("Basic {}", BASE64_STANDARD.encode("admin:pa:ss"));
        assert_eq!(parse_basic(&value), Some(("admin".into(), "pa:ss".into())));
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic(&format!("Basic {}", BASE64_STANDARD.encode("nocolon"))), None);
    }
}
