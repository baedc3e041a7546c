//! Orchestration Root - launches every discovered group and awaits them all
//!
//! For each role-group the router decides whether it gets a shared hub with a
//! queue filler, plain independent workers, or nothing. All tasks are spawned
//! before any is awaited; the run completes once every worker and filler has
//! reached a terminal state. Errors stay inside the group that produced them.

use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::report::{FailureRecord, GroupReport, OrchestrationResult, OrchestrationSummary};
use crate::config::{AppConfig, FillerConfig, HubSettings};
use crate::discovery::DiscoveredGroup;
use crate::error::{FleetError, Result};
use crate::platform::{
    DistributionSource, GroupAction, Hub, HubOverrides, PathDistribution, Role, RoleRouter,
    WorkerConfig, WorkerRunner,
};
use crate::supervisor::{FillerReport, QueueFiller, WorkerHandle, WorkerSupervisor};

/// Builds the distribution source for a filler from its declared path
pub type SourceFactory = Arc<dyn Fn(&Path) -> Arc<dyn DistributionSource> + Send + Sync>;

enum LaunchedTask {
    Worker {
        group: usize,
        handle: WorkerHandle,
    },
    Filler {
        group: usize,
        role: Role,
        join: JoinHandle<FillerReport>,
    },
}

enum TaskOutcome {
    Worker {
        group: usize,
        role: Role,
        worker_id: String,
        result: Result<()>,
    },
    Filler {
        group: usize,
        role: Role,
        result: Result<FillerReport>,
    },
}

impl LaunchedTask {
    async fn wait(self) -> TaskOutcome {
        match self {
            LaunchedTask::Worker { group, handle } => {
                let result = match handle.join.await {
                    Ok(result) => result,
                    Err(e) => Err(FleetError::Join(e)),
                };
                TaskOutcome::Worker {
                    group,
                    role: handle.role,
                    worker_id: handle.worker_id,
                    result,
                }
            }
            LaunchedTask::Filler { group, role, join } => TaskOutcome::Filler {
                group,
                role,
                result: join.await.map_err(FleetError::Join),
            },
        }
    }
}

pub struct OrchestrationRoot {
    hub: HubSettings,
    filler: FillerConfig,
    runner: Arc<dyn WorkerRunner>,
    sources: SourceFactory,
    cancel: CancellationToken,
}

impl std::fmt::Debug for OrchestrationRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationRoot")
            .field("hub", &self.hub)
            .field("filler", &self.filler)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl OrchestrationRoot {
    pub fn new(config: &AppConfig, runner: Arc<dyn WorkerRunner>, cancel: CancellationToken) -> Self {
        Self {
            hub: config.hub.clone(),
            filler: config.filler.clone(),
            runner,
            sources: Arc::new(|path: &Path| {
                Arc::new(PathDistribution::new(path)) as Arc<dyn DistributionSource>
            }),
            cancel,
        }
    }

    /// Replace the filesystem distribution source
    pub fn with_source_factory(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }

    /// The token shared by every task this root launches
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch all groups and wait for every task to finish
    pub async fn run(&self, groups: Vec<DiscoveredGroup>) -> OrchestrationResult {
        let total: usize = groups.iter().map(DiscoveredGroup::len).sum();
        if total == 0 {
            warn!("No workers started. Verify folder configs.");
            return OrchestrationResult::NothingToDo;
        }

        let started_at = Utc::now();
        let overrides = self.load_overrides().await;
        let supervisor = WorkerSupervisor::new(Arc::clone(&self.runner), self.cancel.clone());

        let mut reports = Vec::with_capacity(groups.len());
        let mut hubs: Vec<Option<Arc<Hub>>> = Vec::with_capacity(groups.len());
        let mut failures = Vec::new();
        let mut tasks = Vec::new();

        for (index, group) in groups.into_iter().enumerate() {
            let discovered = group.len();
            let directory = group.directory;
            let action = RoleRouter::route(group.role, group.configs);
            let mut report = GroupReport::new(action.role(), directory, action.strategy(), discovered);
            let mut group_hub = None;

            if discovered == 0 {
                report.skipped = Some("no configs discovered".to_string());
                reports.push(report);
                hubs.push(None);
                continue;
            }

            match action {
                GroupAction::Inert { role, ignored } => {
                    if ignored > 0 {
                        warn!("Ignoring {} config(s) for inert role {}", ignored, role);
                    }
                    report.skipped = Some("inert role".to_string());
                }
                GroupAction::Standalone { role, configs } => {
                    info!("Creating {} {} worker(s)", configs.len(), role);
                    let handles = supervisor.launch_group(role, &configs, None);
                    report.launched = handles.len();
                    tasks.extend(
                        handles
                            .into_iter()
                            .map(|handle| LaunchedTask::Worker { group: index, handle }),
                    );
                }
                GroupAction::SharedHub { role, configs } => {
                    match self.prepare_hub(role, &configs, &overrides) {
                        Ok((hub, distribution)) => {
                            info!(
                                "Creating a hub for {} worker(s) with random distribution from {}",
                                configs.len(),
                                distribution.display()
                            );
                            let handles = supervisor.launch_group(role, &configs, Some(&hub));
                            report.launched = handles.len();
                            report.hub_config = Some(hub.snapshot_config());
                            tasks.extend(
                                handles
                                    .into_iter()
                                    .map(|handle| LaunchedTask::Worker { group: index, handle }),
                            );

                            let source = (self.sources)(&distribution);
                            let filler = QueueFiller::new(Arc::clone(&hub), source, &self.filler);
                            tasks.push(LaunchedTask::Filler {
                                group: index,
                                role,
                                join: filler.spawn(self.cancel.clone()),
                            });
                            group_hub = Some(hub);
                        }
                        Err(e) => {
                            error!("Skipping {} group: {}", role, e);
                            report.skipped = Some(e.to_string());
                            failures.push(FailureRecord::new(role, "hub", &e));
                        }
                    }
                }
            }

            info!(
                "Role {}: discovered {}, launched {}",
                report.role, report.discovered, report.launched
            );
            reports.push(report);
            hubs.push(group_hub);
        }

        let tasks_awaited = tasks.len();
        info!("Awaiting {} task(s)", tasks_awaited);
        let outcomes = join_all(tasks.into_iter().map(LaunchedTask::wait)).await;

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Worker {
                    group,
                    role,
                    worker_id,
                    result,
                } => {
                    if let Err(e) = result {
                        reports[group].failed += 1;
                        failures.push(FailureRecord::new(role, worker_id, &e));
                    }
                }
                TaskOutcome::Filler {
                    group,
                    role,
                    result,
                } => match result {
                    Ok(filler) => reports[group].filler = Some(filler),
                    Err(e) => failures.push(FailureRecord::new(role, "filler", &e)),
                },
            }
        }

        for (report, hub) in reports.iter_mut().zip(&hubs) {
            report.queue = hub.as_ref().map(|hub| hub.stats());
        }

        let summary = OrchestrationSummary {
            started_at,
            finished_at: Utc::now(),
            tasks_awaited,
            groups: reports,
            failures,
        };
        info!(
            "All {} task(s) finished with {} failure(s)",
            summary.tasks_awaited,
            summary.failures.len()
        );
        OrchestrationResult::Completed(summary)
    }

    /// Override file is read once per run; errors are kept as text so each
    /// hub group can report its own `HubConfig` failure.
    async fn load_overrides(&self) -> std::result::Result<Option<HubOverrides>, String> {
        let path = &self.hub.override_file;
        match HubOverrides::load(path).await {
            Ok(Some(overrides)) => {
                info!("{} found. Updating hub settings", path.display());
                Ok(Some(overrides))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Hub override file rejected: {}", e);
                Err(e.to_string())
            }
        }
    }

    fn prepare_hub(
        &self,
        role: Role,
        configs: &[WorkerConfig],
        overrides: &std::result::Result<Option<HubOverrides>, String>,
    ) -> Result<(Arc<Hub>, PathBuf)> {
        let overrides = overrides.clone().map_err(FleetError::HubConfig)?;
        let distribution = configs
            .first()
            .and_then(WorkerConfig::distribution_path)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                FleetError::HubConfig(format!(
                    "first config of {} declares no distribution path (field {})",
                    role,
                    WorkerConfig::DISTRIBUTION_FIELD
                ))
            })?;

        let hub = Hub::construct(role, self.hub.initial(), overrides)?;
        Ok((Arc::new(hub), distribution))
    }
}
