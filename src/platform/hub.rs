//! Trade Hub - shared coordination state for one role-group
//!
//! Every worker of a group and the group's queue filler hold the same
//! `Arc<Hub>`. The queue and the worker registry are the only mutable state,
//! each behind its own mutex; the hub config is fixed at construction.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::queue::{QueueStats, WorkQueue};
use super::types::{HubConfig, Role, WorkItem};
use crate::error::{FleetError, Result};

/// Code bounds read from the optional two-line override file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubOverrides {
    pub min_code: i32,
    pub max_code: i32,
}

impl HubOverrides {
    /// Parse override content: line 1 = min code, line 2 = max code.
    ///
    /// A leading BOM and trailing blank lines are accepted; any other
    /// content after the second line is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().map(str::trim);
        let min_code = parse_code(lines.next(), "min code")?;
        let max_code = parse_code(lines.next(), "max code")?;
        if let Some(extra) = lines.find(|line| !line.is_empty()) {
            return Err(FleetError::HubConfig(format!(
                "unexpected content after max code: {extra:?}"
            )));
        }
        Ok(Self { min_code, max_code })
    }

    /// Read the override file, returning `None` if it does not exist.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::parse(&text).map(Some).map_err(|e| match e {
                FleetError::HubConfig(reason) => {
                    FleetError::HubConfig(format!("{}: {}", path.display(), reason))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FleetError::HubConfig(format!(
                "{}: unreadable ({})",
                path.display(),
                e
            ))),
        }
    }

    pub fn apply(&self, mut config: HubConfig) -> HubConfig {
        config.min_code = self.min_code;
        config.max_code = self.max_code;
        config
    }
}

fn parse_code(line: Option<&str>, what: &str) -> Result<i32> {
    let line = line.ok_or_else(|| FleetError::HubConfig(format!("missing {what} line")))?;
    line.parse::<i32>()
        .map_err(|e| FleetError::HubConfig(format!("invalid {what} {line:?}: {e}")))
}

/// Shared hub for one role-group
#[derive(Debug)]
pub struct Hub {
    role: Role,
    config: HubConfig,
    queue: Mutex<WorkQueue>,
    item_ready: Notify,
    workers: Mutex<Vec<String>>,
    attached_total: AtomicUsize,
}

impl Hub {
    /// Build a hub from `initial`, applying `overrides` if present.
    ///
    /// Fails with [`FleetError::HubConfig`] when the resulting range is
    /// inverted.
    pub fn construct(role: Role, initial: HubConfig, overrides: Option<HubOverrides>) -> Result<Self> {
        let config = match overrides {
            Some(overrides) => {
                info!(
                    "Hub {} using override codes {}..={}",
                    role, overrides.min_code, overrides.max_code
                );
                overrides.apply(initial)
            }
            None => initial,
        };

        if !config.is_valid() {
            return Err(FleetError::HubConfig(format!(
                "min_code {} > max_code {}",
                config.min_code, config.max_code
            )));
        }

        Ok(Self {
            role,
            config,
            queue: Mutex::new(WorkQueue::new()),
            item_ready: Notify::new(),
            workers: Mutex::new(Vec::new()),
            attached_total: AtomicUsize::new(0),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Read-only copy of the hub settings
    pub fn snapshot_config(&self) -> HubConfig {
        self.config
    }

    fn queue(&self) -> MutexGuard<'_, WorkQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn workers(&self) -> MutexGuard<'_, Vec<String>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Queue ====================

    /// Add an item to the back of the shared queue
    pub fn enqueue(&self, item: WorkItem) {
        self.queue().enqueue(item);
        self.item_ready.notify_one();
    }

    /// Take the oldest item without waiting
    pub fn dequeue(&self) -> Option<WorkItem> {
        self.queue().dequeue()
    }

    /// Wait for the next item, or `None` once `cancel` fires
    pub async fn next_item(&self, cancel: &CancellationToken) -> Option<WorkItem> {
        loop {
            if let Some(item) = self.dequeue() {
                return Some(item);
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = self.item_ready.notified() => {}
            }
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue().is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        self.queue().stats()
    }

    // ==================== Worker registry ====================

    /// Register a worker; it stays attached until the returned guard drops
    pub fn attach(self: &Arc<Self>, worker_id: impl Into<String>) -> WorkerAttachment {
        let worker_id = worker_id.into();
        self.workers().push(worker_id.clone());
        self.attached_total.fetch_add(1, Ordering::SeqCst);
        debug!("Worker {} attached to {} hub", worker_id, self.role);

        WorkerAttachment {
            hub: Arc::clone(self),
            worker_id,
        }
    }

    fn detach(&self, worker_id: &str) {
        let mut workers = self.workers();
        if let Some(pos) = workers.iter().position(|w| w == worker_id) {
            workers.remove(pos);
            debug!("Worker {} detached from {} hub", worker_id, self.role);
        }
    }

    pub fn attached_workers(&self) -> Vec<String> {
        self.workers().clone()
    }

    /// True once at least one worker attached and every one has since left
    pub fn all_workers_detached(&self) -> bool {
        self.attached_total.load(Ordering::SeqCst) > 0 && self.workers().is_empty()
    }
}

/// Registry entry for a worker attached to a hub
#[derive(Debug)]
pub struct WorkerAttachment {
    hub: Arc<Hub>,
    worker_id: String,
}

impl Drop for WorkerAttachment {
    fn drop(&mut self) {
        self.hub.detach(&self.worker_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn default_hub() -> Arc<Hub> {
        Arc::new(Hub::construct(Role::LinkTrade, HubConfig::default(), None).unwrap())
    }

    #[test]
    fn test_construct_defaults() {
        let hub = default_hub();
        assert_eq!(hub.snapshot_config(), HubConfig::default());
        assert!(hub.is_queue_empty());
        assert_eq!(hub.role(), Role::LinkTrade);
    }

    #[test]
    fn test_construct_with_overrides() {
        let overrides = HubOverrides::parse("100\n999\n").unwrap();
        let hub = Hub::construct(Role::LinkTrade, HubConfig::default(), Some(overrides)).unwrap();
        assert_eq!(
            hub.snapshot_config(),
            HubConfig {
                min_code: 100,
                max_code: 999
            }
        );

        // 相等邊界也合法
        let equal = HubOverrides::parse("5\n5").unwrap();
        assert!(Hub::construct(Role::LinkTrade, HubConfig::default(), Some(equal)).is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let overrides = HubOverrides::parse("999\n100\n").unwrap();
        let err = Hub::construct(Role::LinkTrade, HubConfig::default(), Some(overrides)).unwrap_err();
        assert!(matches!(err, FleetError::HubConfig(_)));

        let initial = HubConfig {
            min_code: 3,
            max_code: 1,
        };
        assert!(Hub::construct(Role::SurpriseTrade, initial, None).is_err());
    }

    #[test]
    fn test_override_parse_errors() {
        assert!(matches!(
            HubOverrides::parse("100\n"),
            Err(FleetError::HubConfig(_))
        ));
        assert!(HubOverrides::parse("").is_err());
        assert!(HubOverrides::parse("abc\n200").is_err());
        assert_eq!(
            HubOverrides::parse(" 1 \r\n 2 \r\n\r\n").unwrap(),
            HubOverrides {
                min_code: 1,
                max_code: 2
            }
        );
        assert!(matches!(
            HubOverrides::parse("1\n2\n3\n"),
            Err(FleetError::HubConfig(_))
        ));
    }

    #[test]
    fn test_override_parse_strips_bom() {
        assert_eq!(
            HubOverrides::parse("\u{feff}100\r\n999\r\n").unwrap(),
            HubOverrides {
                min_code: 100,
                max_code: 999
            }
        );
    }

    #[tokio::test]
    async fn test_override_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            HubOverrides::load(&dir.path().join("hub.txt")).await.unwrap(),
            None
        );

        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "not-a-number\n").unwrap();
        assert!(HubOverrides::load(&path).await.is_err());

        // Windows editors save with a BOM
        let path = dir.path().join("bom.txt");
        std::fs::write(&path, "\u{feff}8000\r\n8010\r\n").unwrap();
        assert_eq!(
            HubOverrides::load(&path).await.unwrap(),
            Some(HubOverrides {
                min_code: 8000,
                max_code: 8010
            })
        );
    }

    #[test]
    fn test_shared_fifo() {
        let hub = default_hub();
        hub.enqueue(WorkItem::real("a", 1, ""));
        hub.enqueue(WorkItem::real("b", 2, ""));

        assert_eq!(hub.queue_len(), 2);
        assert_eq!(hub.dequeue().unwrap().code, 1);
        assert_eq!(hub.dequeue().unwrap().code, 2);
        assert!(hub.dequeue().is_none());
        assert_eq!(hub.stats().dequeued_total, 2);
    }

    #[test]
    fn test_worker_registry() {
        let hub = default_hub();
        assert!(!hub.all_workers_detached());

        let a = hub.attach("bot1");
        let b = hub.attach("bot2");
        assert_eq!(hub.attached_workers(), vec!["bot1", "bot2"]);

        drop(a);
        assert_eq!(hub.attached_workers(), vec!["bot2"]);
        assert!(!hub.all_workers_detached());

        drop(b);
        assert!(hub.all_workers_detached());
    }

    #[tokio::test]
    async fn test_next_item_wakes_on_enqueue() {
        let hub = default_hub();
        let cancel = CancellationToken::new();

        let waiter = {
            let hub = hub.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { hub.next_item(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        hub.enqueue(WorkItem::real("viewer", 8185, "payload"));

        let item = waiter.await.unwrap().unwrap();
        assert_eq!(item.code, 8185);
    }

    #[tokio::test]
    async fn test_next_item_returns_none_on_cancel() {
        let hub = default_hub();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(hub.next_item(&cancel).await.is_none());
    }
}
