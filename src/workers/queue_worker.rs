//! Built-in worker that drains its hub's queue
//!
//! Stands in for device-specific worker logic: it validates the connection
//! fields of its config, then takes items from the shared hub one at a time
//! until cancelled. Hub-less workers simply idle until cancelled.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::WorkerSettings;
use crate::error::{FleetError, Result};
use crate::platform::{WorkerContext, WorkerRunner};

/// Host and port taken from fields 0 and 1 of a worker config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn from_context(ctx: &WorkerContext) -> Result<Self> {
        let host = ctx
            .config
            .field(0)
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FleetError::worker_startup(&ctx.worker_id, "missing host (line 1)"))?;
        let port_field = ctx
            .config
            .field(1)
            .map(str::trim)
            .ok_or_else(|| FleetError::worker_startup(&ctx.worker_id, "missing port (line 2)"))?;
        let port = port_field.parse::<u16>().map_err(|e| {
            FleetError::worker_startup(&ctx.worker_id, format!("invalid port {port_field:?}: {e}"))
        })?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct QueueWorker {
    item_duration: Duration,
}

impl QueueWorker {
    pub fn new(settings: &WorkerSettings) -> Self {
        Self {
            item_duration: Duration::from_millis(settings.item_duration_ms),
        }
    }
}

#[async_trait]
impl WorkerRunner for QueueWorker {
    async fn run(&self, ctx: WorkerContext) -> Result<()> {
        let endpoint = Endpoint::from_context(&ctx)?;
        info!(worker = %ctx.worker_id, "Worker ready for {}", endpoint);

        let Some(hub) = ctx.hub.as_ref() else {
            ctx.cancel.cancelled().await;
            return Ok(());
        };

        let mut processed = 0u64;
        while let Some(item) = hub.next_item(&ctx.cancel).await {
            debug!(
                worker = %ctx.worker_id,
                "Processing item {} (code {:04}, synthetic: {}, payload: {})",
                item.item_id,
                item.code,
                item.is_synthetic(),
                item.payload
            );

            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.item_duration) => processed += 1,
            }
        }

        info!(worker = %ctx.worker_id, "Worker stopping after {} item(s)", processed);
        Ok(())
    }
}
