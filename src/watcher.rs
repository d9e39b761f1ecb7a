// src/watcher.rs
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::alert::AlertDispatcher;
use crate::error::Result;
use crate::event::read_events;
use crate::session::{SessionAggregator, SessionMap};
use crate::snapshot::SnapshotFetcher;
use crate::tracker::CompletionTracker;

/// Fetch the current snapshot and rebuild every session from scratch.
pub async fn collect_sessions(
    fetcher: &dyn SnapshotFetcher,
    aggregator: &SessionAggregator,
) -> Result<SessionMap> {
    let path = fetcher.fetch().await?;
    let events = tokio::task::spawn_blocking(move || read_events(&path)).await?;
    debug!(events = events.len(), "decoded honeypot events");
    Ok(aggregator.aggregate(&events))
}

/// What one poll did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub sessions: usize,
    pub completed: usize,
    pub delivered: usize,
}

/// The polling alerter. Sole owner of the notified set.
pub struct Watcher {
    fetcher: Arc<dyn SnapshotFetcher>,
    aggregator: SessionAggregator,
    tracker: CompletionTracker,
    dispatcher: AlertDispatcher,
}

impl Watcher {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        aggregator: SessionAggregator,
        tracker: CompletionTracker,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self { fetcher, aggregator, tracker, dispatcher }
    }

    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    /// One fetch-aggregate-notify pass. A failed fetch changes nothing.
    pub async fn poll_once(&mut self) -> Result<PollReport> {
        let sessions = collect_sessions(self.fetcher.as_ref(), &self.aggregator).await?;
        let completed = self.tracker.take_completed(&sessions);

        let mut delivered = 0;
        for session in &completed {
            if self.dispatcher.dispatch(session).await {
                delivered += 1;
            }
        }

        Ok(PollReport { sessions: sessions.len(), completed: completed.len(), delivered })
    }

    /// Poll every `interval` until `shutdown` resolves.
    ///
    /// `shutdown` is polled before any work starts and raced against each
    /// pass, so an interrupt mid-fetch or mid-dispatch stops the loop.
    pub async fn run<F>(&mut self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(interval_secs = interval.as_secs(), "honeypot watcher started");

        loop {
            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                res = self.poll_once() => Some(res),
            };
            match outcome {
                Some(res) => log_poll(res),
                None => break,
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(notified = self.tracker.notified().len(), "shutting down watcher");
    }
}

fn log_poll(res: Result<PollReport>) {
    match res {
        Ok(report) if report.completed > 0 => info!(
            sessions = report.sessions,
            completed = report.completed,
            delivered = report.delivered,
            "poll finished"
        ),
        Ok(report) => debug!(sessions = report.sessions, "poll finished, nothing closed"),
        Err(e) => warn!(error = %e, "poll skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Notifier;
    use crate::geo::{Country, GeoResolver};
    use crate::snapshot::LocalFile;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoGeo;

    #[async_trait]
    impl GeoResolver for NoGeo {
        async fn country(&self, _ip: Option<&str>) -> Country {
            Country::Unknown
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Notifier for Counting {
        async fn send(&self, _text: &str) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl SnapshotFetcher for Broken {
        async fn fetch(&self) -> Result<std::path::PathBuf> {
            Err(crate::HoneywatchError::Snapshot("container unreachable".into()))
        }
    }

    fn watcher(fetcher: Arc<dyn SnapshotFetcher>, notifier: Arc<Counting>) -> Watcher {
        Watcher::new(
            fetcher,
            SessionAggregator::default(),
            CompletionTracker::default(),
            AlertDispatcher::new(Arc::new(NoGeo), notifier),
        )
    }

    #[tokio::test]
    async fn failed_fetch_mutates_nothing() {
        let notifier = Arc::new(Counting::default());
        let mut w = watcher(Arc::new(Broken), notifier.clone());
        assert!(w.poll_once().await.is_err());
        assert!(w.tracker().notified().is_empty());
        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);
    }

    struct Failing(AtomicUsize);

    #[async_trait]
    impl Notifier for Failing {
        async fn send(&self, _text: &str) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(crate::HoneywatchError::NotifyRejected { status: 502, body: "bad gateway".into() })
        }
    }

    /// Signals once the fetch has started, then never finishes.
    struct Stalled(Arc<tokio::sync::Notify>);

    #[async_trait]
    impl SnapshotFetcher for Stalled {
        async fn fetch(&self) -> Result<std::path::PathBuf> {
            self.0.notify_one();
            std::future::pending().await
        }
    }

    fn closed_log() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"session":"S","eventid":"cowrie.session.closed"}}"#).unwrap();
        file
    }

    #[tokio::test]
    async fn collect_sessions_reads_snapshot() {
        let file = closed_log();
        let fetcher = LocalFile(file.path().to_path_buf());
        let map = collect_sessions(&fetcher, &SessionAggregator::default()).await.unwrap();
        assert!(map["S"].closed);
    }

    #[tokio::test]
    async fn run_polls_until_shutdown() {
        let file = closed_log();
        let notifier = Arc::new(Counting::default());
        let mut w = watcher(Arc::new(LocalFile(file.path().to_path_buf())), notifier.clone());
        w.run(Duration::from_secs(3600), tokio::time::sleep(Duration::from_millis(500))).await;

        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
        assert!(w.tracker().notified().contains("S"));
    }

    #[tokio::test]
    async fn shutdown_before_first_pass_does_no_work() {
        let file = closed_log();
        let notifier = Arc::new(Counting::default());
        let mut w = watcher(Arc::new(LocalFile(file.path().to_path_buf())), notifier.clone());
        w.run(Duration::from_secs(3600), async {}).await;

        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);
        assert!(w.tracker().notified().is_empty());
    }

    #[tokio::test]
    async fn shutdown_interrupts_slow_fetch() {
        let started = Arc::new(tokio::sync::Notify::new());
        let notifier = Arc::new(Counting::default());
        let mut w = watcher(Arc::new(Stalled(started.clone())), notifier.clone());

        let shutdown = async move { started.notified().await };
        let run = w.run(Duration::from_secs(3600), shutdown);
        let finished = tokio::time::timeout(Duration::from_secs(5), run).await;

        assert!(finished.is_ok(), "watcher kept running after shutdown");
        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);
        assert!(w.tracker().notified().is_empty());
    }

    #[tokio::test]
    async fn failed_dispatch_is_not_retried() {
        let file = closed_log();
        let notifier = Arc::new(Failing(AtomicUsize::new(0)));
        let mut w = Watcher::new(
            Arc::new(LocalFile(file.path().to_path_buf())),
            SessionAggregator::default(),
            CompletionTracker::default(),
            AlertDispatcher::new(Arc::new(NoGeo), notifier.clone()),
        );

        for _ in 0..3 {
            w.poll_once().await.unwrap();
        }

        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
        assert!(w.tracker().notified().contains("S"));
    }
}
