pub mod cli;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod platform;
pub mod supervisor;
pub mod workers;

pub use config::AppConfig;
pub use coordinator::{
    FailureRecord, GroupReport, OrchestrationResult, OrchestrationRoot, OrchestrationSummary,
};
pub use discovery::{ConfigDiscovery, DiscoveredGroup};
pub use error::{FleetError, Result};
pub use platform::{
    DistributionSource, GroupAction, Hub, HubConfig, HubOverrides, LaunchStrategy,
    PathDistribution, QueueStats, Role, RoleRouter, WorkItem, WorkSource, WorkerConfig,
    WorkerContext, WorkerRunner,
};
pub use supervisor::{FillerReport, QueueFiller, WorkerHandle, WorkerSupervisor};
pub use workers::QueueWorker;
