//! Worker Supervisor - one task per worker config

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{FleetError, Result};
use crate::platform::{Hub, Role, WorkerConfig, WorkerContext, WorkerRunner};

/// Handle to one launched worker task
#[derive(Debug)]
pub struct WorkerHandle {
    pub worker_id: String,
    pub role: Role,
    pub join: JoinHandle<Result<()>>,
}

/// Starts worker tasks for a role-group.
///
/// Every worker receives the same cancellation token and, for hub-bound
/// roles, a clone of the same `Arc<Hub>`.
#[derive(Clone)]
pub struct WorkerSupervisor {
    runner: Arc<dyn WorkerRunner>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for WorkerSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerSupervisor")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl WorkerSupervisor {
    pub fn new(runner: Arc<dyn WorkerRunner>, cancel: CancellationToken) -> Self {
        Self { runner, cancel }
    }

    /// Launch one worker per config; always returns `configs.len()` handles.
    ///
    /// A config that cannot start yields a handle that resolves to
    /// [`FleetError::WorkerStartup`] instead of affecting its siblings.
    pub fn launch_group(
        &self,
        role: Role,
        configs: &[WorkerConfig],
        hub: Option<&Arc<Hub>>,
    ) -> Vec<WorkerHandle> {
        configs
            .iter()
            .enumerate()
            .map(|(index, config)| self.launch_one(role, index, config, hub))
            .collect()
    }

    fn launch_one(
        &self,
        role: Role,
        index: usize,
        config: &WorkerConfig,
        hub: Option<&Arc<Hub>>,
    ) -> WorkerHandle {
        let worker_id = format!("{}#{}", role, index + 1);

        if config.is_empty() {
            let err = FleetError::worker_startup(
                &worker_id,
                format!("config {} has no fields", config.origin),
            );
            error!(worker = %worker_id, "{}", err);
            return WorkerHandle {
                worker_id,
                role,
                join: tokio::spawn(async move { Err(err) }),
            };
        }

        // Attach before spawning so the hub never looks abandoned while
        // workers are still starting.
        let attachment = hub.map(|hub| hub.attach(&worker_id));
        let ctx = WorkerContext {
            worker_id: worker_id.clone(),
            role,
            config: config.clone(),
            hub: hub.cloned(),
            cancel: self.cancel.clone(),
        };
        let runner = Arc::clone(&self.runner);
        let id = worker_id.clone();
        let origin = config.origin.clone();

        let join = tokio::spawn(async move {
            let _attachment = attachment;
            info!(worker = %id, role = %role, "Starting worker from {}", origin);

            let result = runner.run(ctx).await;
            match &result {
                Ok(()) => info!(worker = %id, "Worker finished"),
                Err(e) => error!(worker = %id, "Worker failed: {}", e),
            }
            result
        });

        WorkerHandle {
            worker_id,
            role,
            join,
        }
    }
}
