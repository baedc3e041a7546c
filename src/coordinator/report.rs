//! Orchestration Report - what a run launched and how it ended

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::FleetError;
use crate::platform::{HubConfig, LaunchStrategy, QueueStats, Role};
use crate::supervisor::FillerReport;

/// Per-group outcome
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub role: Role,
    pub directory: PathBuf,
    pub strategy: LaunchStrategy,
    /// Configs discovered for the group
    pub discovered: usize,
    /// Worker tasks actually started
    pub launched: usize,
    /// Workers that ended with an error
    pub failed: usize,
    pub hub_config: Option<HubConfig>,
    pub queue: Option<QueueStats>,
    pub filler: Option<FillerReport>,
    /// Why the group was not launched, if it was not
    pub skipped: Option<String>,
}

impl GroupReport {
    pub(crate) fn new(role: Role, directory: PathBuf, strategy: LaunchStrategy, discovered: usize) -> Self {
        Self {
            role,
            directory,
            strategy,
            discovered,
            launched: 0,
            failed: 0,
            hub_config: None,
            queue: None,
            filler: None,
            skipped: None,
        }
    }
}

/// One error surfaced by the run
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub role: Role,
    /// Worker id, "hub" or "filler"
    pub scope: String,
    pub category: String,
    pub message: String,
}

impl FailureRecord {
    pub(crate) fn new(role: Role, scope: impl Into<String>, error: &FleetError) -> Self {
        Self {
            role,
            scope: scope.into(),
            category: error.category().to_string(),
            message: error.to_string(),
        }
    }
}

/// Aggregate of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Worker and filler tasks awaited
    pub tasks_awaited: usize,
    pub groups: Vec<GroupReport>,
    pub failures: Vec<FailureRecord>,
}

impl OrchestrationSummary {
    pub fn workers_launched(&self) -> usize {
        self.groups.iter().map(|g| g.launched).sum()
    }

    pub fn fillers_launched(&self) -> usize {
        self.groups.iter().filter(|g| g.filler.is_some()).count()
    }

    pub fn hubs_constructed(&self) -> usize {
        self.groups.iter().filter(|g| g.hub_config.is_some()).count()
    }

    pub fn group(&self, role: Role) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.role == role)
    }
}

impl std::fmt::Display for OrchestrationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Run finished: {} worker(s), {} filler(s), {} task(s) awaited in {}s",
            self.workers_launched(),
            self.fillers_launched(),
            self.tasks_awaited,
            (self.finished_at - self.started_at).num_seconds()
        )?;
        for group in &self.groups {
            write!(
                f,
                "  {:<15} discovered={} launched={} failed={}",
                group.role, group.discovered, group.launched, group.failed
            )?;
            if let Some(queue) = &group.queue {
                write!(f, " {}", queue)?;
            }
            if let Some(reason) = &group.skipped {
                write!(f, " skipped: {}", reason)?;
            }
            writeln!(f)?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  ! {} [{}] {}: {}",
                failure.role, failure.category, failure.scope, failure.message
            )?;
        }
        Ok(())
    }
}

/// Outcome of [`super::OrchestrationRoot::run`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrchestrationResult {
    /// No worker configs were discovered anywhere
    NothingToDo,
    /// Every launched task reached a terminal state
    Completed(OrchestrationSummary),
}

impl OrchestrationResult {
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, OrchestrationResult::NothingToDo)
    }

    pub fn summary(&self) -> Option<&OrchestrationSummary> {
        match self {
            OrchestrationResult::NothingToDo => None,
            OrchestrationResult::Completed(summary) => Some(summary),
        }
    }
}
