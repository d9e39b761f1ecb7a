// src/error.rs
use thiserror::Error;

/// Everything that can go wrong inside honeywatch.
///
/// Only `Config` is fatal; the rest are logged at the boundary that
/// swallows them and the current pass degrades or is skipped.
#[derive(Error, Debug)]
pub enum HoneywatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot fetch failed: {0}")]
    Snapshot(String),

    #[error("notification rejected with status {status}: {body}")]
    NotifyRejected { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, HoneywatchError>;
