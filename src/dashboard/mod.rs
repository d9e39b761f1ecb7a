// src/dashboard/mod.rs
//! Read-only web view of IDS alerts and honeypot sessions.
//!
//! ## Endpoints
//! - `GET /`             - IDS alert table
//! - `GET /honeypot`     - honeypot session cards
//! - `GET /api/alerts`   - IDS alerts as JSON
//! - `GET /api/sessions` - honeypot sessions as JSON
//! - `GET /health`       - liveness, no auth
//!
//! Every request re-reads the logs; nothing is cached between requests.

pub mod auth;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ids::{parse_ids_log, AlertRecord};
use crate::session::{display_sessions, SessionAggregator, SessionRecord};
use crate::snapshot::SnapshotFetcher;
use crate::watcher::collect_sessions;

pub use auth::{CredentialVerifier, StaticCredentials};

#[derive(Clone)]
pub struct DashboardState {
    pub ids_log: PathBuf,
    pub fetcher: Arc<dyn SnapshotFetcher>,
    pub aggregator: Arc<SessionAggregator>,
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Concurrent requests would otherwise overwrite the same snapshot file.
    fetch_lock: Arc<Mutex<()>>,
}

impl DashboardState {
    pub fn new(
        ids_log: PathBuf,
        fetcher: Arc<dyn SnapshotFetcher>,
        aggregator: SessionAggregator,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            ids_log,
            fetcher,
            aggregator: Arc::new(aggregator),
            verifier,
            fetch_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn alerts(&self) -> Vec<AlertRecord> {
        let path = self.ids_log.clone();
        match tokio::task::spawn_blocking(move || parse_ids_log(&path)).await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "IDS log reader panicked");
                Vec::new()
            }
        }
    }

    async fn sessions(&self) -> Vec<SessionRecord> {
        let _guard = self.fetch_lock.lock().await;
        match collect_sessions(self.fetcher.as_ref(), &self.aggregator).await {
            Ok(map) => display_sessions(&map),
            Err(e) => {
                warn!(error = %e, "honeypot snapshot unavailable");
                Vec::new()
            }
        }
    }
}

pub fn create_router(state: DashboardState) -> Router {
    let protected = Router::new()
        .route("/", get(ids_page))
        .route("/honeypot", get(honeypot_page))
        .route("/api/alerts", get(api_alerts))
        .route("/api/sessions", get(api_sessions))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(bind: &str, state: DashboardState, shutdown: F) -> crate::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, "dashboard listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn ids_page(State(state): State<DashboardState>) -> Html<String> {
    Html(render::ids_page(&state.alerts().await))
}

async fn honeypot_page(State(state): State<DashboardState>) -> Html<String> {
    Html(render::honeypot_page(&state.sessions().await))
}

async fn api_alerts(State(state): State<DashboardState>) -> Json<Vec<AlertRecord>> {
    Json(state.alerts().await)
}

async fn api_sessions(State(state): State<DashboardState>) -> Json<Vec<SessionRecord>> {
    Json(state.sessions().await)
}
