//! Core traits for the launcher's external collaborators

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::hub::Hub;
use super::types::{Role, WorkerConfig};
use crate::error::{FleetError, Result};

/// Everything a worker gets from the launcher
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// Unique within a run, derived from the config's origin
    pub worker_id: String,
    pub role: Role,
    pub config: WorkerConfig,
    /// Shared hub of the group, `None` for hub-less roles
    pub hub: Option<Arc<Hub>>,
    pub cancel: CancellationToken,
}

/// Per-worker execution logic.
///
/// The launcher only cares whether a worker finished or failed. A worker
/// should return promptly once `ctx.cancel` fires.
#[async_trait]
pub trait WorkerRunner: Send + Sync {
    /// 運行 worker 直到完成或取消
    async fn run(&self, ctx: WorkerContext) -> Result<()>;
}

/// Feed of candidates used to build synthetic work items
#[async_trait]
pub trait DistributionSource: Send + Sync {
    /// Path this source reads from, used in logs and item tags
    fn path(&self) -> &Path;

    /// Current candidates; an empty list is not an error
    async fn candidates(&self) -> Result<Vec<String>>;
}

/// Distribution source backed by the filesystem.
///
/// A directory yields its file paths, a regular file yields its non-empty
/// lines.
#[derive(Debug, Clone)]
pub struct PathDistribution {
    path: PathBuf,
}

impl PathDistribution {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn source_error(&self, reason: impl std::fmt::Display) -> FleetError {
        FleetError::DistributionSource {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl DistributionSource for PathDistribution {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn candidates(&self) -> Result<Vec<String>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.source_error(e))?;

        if metadata.is_file() {
            let text = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| self.source_error(e))?;
            return Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect());
        }

        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| self.source_error(e))?;
        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| self.source_error(e))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file {
                candidates.push(entry.path().display().to_string());
            }
        }
        candidates.sort();
        Ok(candidates)
    }
}
