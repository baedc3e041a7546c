//! Queue Filler - keeps a hub's queue from sitting empty
//!
//! Whenever the hub's queue is observed empty, the filler draws a random
//! candidate from its distribution source and enqueues one synthetic work
//! item with a random code inside the hub's range. An empty source backs off;
//! a failing source is reported and retried on the next poll. Neither stops
//! the group.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FillerConfig;
use crate::error::Result;
use crate::platform::{DistributionSource, Hub, WorkItem};

/// Counters reported when a filler stops
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillerReport {
    pub injected: u64,
    pub empty_source_polls: u64,
    pub source_errors: u64,
    pub stop_reason: FillerStopReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerStopReason {
    #[default]
    Cancelled,
    /// Every worker of the hub has exited
    WorkersGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillOutcome {
    Injected,
    SourceEmpty,
    Cancelled,
}

pub struct QueueFiller {
    hub: Arc<Hub>,
    source: Arc<dyn DistributionSource>,
    poll_interval: Duration,
    empty_backoff: Duration,
}

impl QueueFiller {
    pub fn new(hub: Arc<Hub>, source: Arc<dyn DistributionSource>, config: &FillerConfig) -> Self {
        Self {
            hub,
            source,
            poll_interval: config.poll_interval(),
            empty_backoff: config.empty_source_backoff(),
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<FillerReport> {
        tokio::spawn(self.run(cancel))
    }

    /// Poll the hub until cancelled or until all of its workers are gone
    pub async fn run(self, cancel: CancellationToken) -> FillerReport {
        let mut report = FillerReport::default();
        info!(
            "Queue filler started for {} hub (source: {})",
            self.hub.role(),
            self.source.path().display()
        );

        loop {
            if cancel.is_cancelled() {
                report.stop_reason = FillerStopReason::Cancelled;
                break;
            }
            if self.hub.all_workers_detached() {
                report.stop_reason = FillerStopReason::WorkersGone;
                break;
            }

            let delay = if self.hub.is_queue_empty() {
                match self.fill_once(&cancel).await {
                    Ok(FillOutcome::Injected) => {
                        report.injected += 1;
                        self.poll_interval
                    }
                    Ok(FillOutcome::SourceEmpty) => {
                        report.empty_source_polls += 1;
                        warn!(
                            "Distribution source {} has no candidates, backing off {:?}",
                            self.source.path().display(),
                            self.empty_backoff
                        );
                        self.empty_backoff
                    }
                    Ok(FillOutcome::Cancelled) => {
                        report.stop_reason = FillerStopReason::Cancelled;
                        break;
                    }
                    Err(e) => {
                        report.source_errors += 1;
                        warn!("Queue filler for {} hub: {}", self.hub.role(), e);
                        self.poll_interval
                    }
                }
            } else {
                self.poll_interval
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    report.stop_reason = FillerStopReason::Cancelled;
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(
            "Queue filler for {} hub stopped ({:?}): injected={}, empty_polls={}, errors={}",
            self.hub.role(),
            report.stop_reason,
            report.injected,
            report.empty_source_polls,
            report.source_errors
        );
        report
    }

    async fn fill_once(&self, cancel: &CancellationToken) -> Result<FillOutcome> {
        let candidates = tokio::select! {
            _ = cancel.cancelled() => return Ok(FillOutcome::Cancelled),
            result = self.source.candidates() => result?,
        };

        let (payload, code) = {
            let mut rng = rand::thread_rng();
            let Some(payload) = candidates.choose(&mut rng).cloned() else {
                return Ok(FillOutcome::SourceEmpty);
            };
            (payload, self.hub.snapshot_config().random_code(&mut rng))
        };

        // 取消後不再注入新工作
        if cancel.is_cancelled() {
            return Ok(FillOutcome::Cancelled);
        }

        debug!("Injecting filler item {} with code {}", payload, code);
        self.hub
            .enqueue(WorkItem::synthetic(self.source.path(), code, payload));
        Ok(FillOutcome::Injected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FleetError;
    use crate::platform::{HubConfig, Role};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct StaticSource {
        path: PathBuf,
        candidates: Vec<String>,
        reads: AtomicU64,
    }

    impl StaticSource {
        fn new(candidates: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                path: PathBuf::from("./dist/test"),
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
                reads: AtomicU64::new(0),
            })
        }
    }

    #[async_trait]
    impl DistributionSource for StaticSource {
        fn path(&self) -> &Path {
            &self.path
        }

        async fn candidates(&self) -> Result<Vec<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    struct BrokenSource(PathBuf);

    #[async_trait]
    impl DistributionSource for BrokenSource {
        fn path(&self) -> &Path {
            &self.0
        }

        async fn candidates(&self) -> Result<Vec<String>> {
            Err(FleetError::DistributionSource {
                path: self.0.display().to_string(),
                reason: "unreadable".to_string(),
            })
        }
    }

    fn fast_config() -> FillerConfig {
        FillerConfig {
            poll_interval_ms: 10,
            empty_source_backoff_ms: 30,
        }
    }

    fn test_hub(min: i32, max: i32) -> Arc<Hub> {
        let initial = HubConfig {
            min_code: min,
            max_code: max,
        };
        Arc::new(Hub::construct(Role::LinkTrade, initial, None).unwrap())
    }

    #[tokio::test]
    async fn test_fills_empty_queue() {
        let hub = test_hub(100, 110);
        let _worker = hub.attach("bot1");
        let cancel = CancellationToken::new();
        let source = StaticSource::new(&["a.pk8", "b.pk8"]);

        let handle = QueueFiller::new(hub.clone(), source, &fast_config()).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        // 隊列非空時不會繼續注入
        assert_eq!(hub.queue_len(), 1);

        let item = hub.dequeue().unwrap();
        assert!(item.is_synthetic());
        assert!((100..=110).contains(&item.code));
        assert!(item.payload == "a.pk8" || item.payload == "b.pk8");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.queue_len(), 1);

        cancel.cancel();
        let report = handle.await.unwrap();
        assert_eq!(report.injected, 2);
        assert_eq!(report.stop_reason, FillerStopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_no_injection_after_cancel() {
        let hub = test_hub(1, 1);
        let _worker = hub.attach("bot1");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = QueueFiller::new(hub.clone(), StaticSource::new(&["x"]), &fast_config())
            .run(cancel)
            .await;

        assert_eq!(report.injected, 0);
        assert!(hub.is_queue_empty());
    }

    #[tokio::test]
    async fn test_empty_source_backs_off() {
        let hub = test_hub(1, 10);
        let _worker = hub.attach("bot1");
        let cancel = CancellationToken::new();
        let source = StaticSource::new(&[]);

        let handle =
            QueueFiller::new(hub.clone(), source.clone(), &fast_config()).spawn(cancel.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert!(hub.is_queue_empty());
        assert!(report.empty_source_polls >= 1);
        // 30ms backoff over ~100ms: no hot loop
        assert!(source.reads.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn test_source_errors_are_not_fatal() {
        let hub = test_hub(1, 10);
        let _worker = hub.attach("bot1");
        let cancel = CancellationToken::new();
        let source = Arc::new(BrokenSource(PathBuf::from("missing")));

        let handle = QueueFiller::new(hub.clone(), source, &fast_config()).spawn(cancel.clone());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        let report = handle.await.unwrap();
        assert!(report.source_errors >= 1);
    }

    #[tokio::test]
    async fn test_source_errors_retry_on_next_poll() {
        let hub = test_hub(1, 10);
        let _worker = hub.attach("bot1");
        let cancel = CancellationToken::new();
        let source = Arc::new(BrokenSource(PathBuf::from("missing")));
        let config = FillerConfig {
            poll_interval_ms: 10,
            empty_source_backoff_ms: 10_000,
        };

        let handle = QueueFiller::new(hub.clone(), source, &config).spawn(cancel.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        // retried at the poll interval, not the empty-source backoff
        assert!(report.source_errors >= 3);
        assert_eq!(report.empty_source_polls, 0);
    }

    #[tokio::test]
    async fn test_stops_when_workers_gone() {
        let hub = test_hub(1, 10);
        let worker = hub.attach("bot1");
        let cancel = CancellationToken::new();

        let handle =
            QueueFiller::new(hub.clone(), StaticSource::new(&["x"]), &fast_config()).spawn(cancel);
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(worker);

        let report = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.stop_reason, FillerStopReason::WorkersGone);
    }
}
