// src/snapshot.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{HoneywatchError, Result};

/// Produces a local point-in-time copy of the honeypot log.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// On success the returned path holds the full current log.
    async fn fetch(&self) -> Result<PathBuf>;
}

/// `docker cp <container>:<internal> <local>`, bounded by a timeout.
pub struct DockerCpFetcher {
    program: String,
    container: String,
    internal_path: String,
    local_path: PathBuf,
    timeout: Duration,
}

impl DockerCpFetcher {
    pub fn new(container: &str, internal_path: &str, local_path: &Path, timeout: Duration) -> Self {
        Self {
            program: "docker".into(),
            container: container.into(),
            internal_path: internal_path.into(),
            local_path: local_path.to_path_buf(),
            timeout,
        }
    }

    /// Use a different binary with docker-compatible `cp` arguments.
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.into();
        self
    }

    fn source(&self) -> String {
        format!("{}:{}", self.container, self.internal_path)
    }
}

#[async_trait]
impl SnapshotFetcher for DockerCpFetcher {
    async fn fetch(&self) -> Result<PathBuf> {
        if let Some(parent) = self.local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("cp").arg(self.source()).arg(&self.local_path).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(res) => res.map_err(|e| HoneywatchError::Snapshot(format!("cannot run {}: {e}", self.program)))?,
            Err(_) => {
                return Err(HoneywatchError::Snapshot(format!(
                    "copy of {} timed out after {:?}",
                    self.source(),
                    self.timeout
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HoneywatchError::Snapshot(format!(
                "copy of {} failed ({}): {}",
                self.source(),
                output.status,
                stderr.trim()
            )));
        }

        debug!(path = %self.local_path.display(), "snapshot refreshed");
        Ok(self.local_path.clone())
    }
}

/// Reads a log that is already on the host.
pub struct LocalFile(pub PathBuf);

#[async_trait]
impl SnapshotFetcher for LocalFile {
    async fn fetch(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}
