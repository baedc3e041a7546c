//! Worker Platform - 共享 hub、工作隊列與角色路由
//!
//! Role-agnostic building blocks: the shared hub every worker of a group
//! attaches to, its FIFO work queue, and the table that maps roles to launch
//! strategies.

mod hub;
mod queue;
mod router;
mod traits;
mod types;

pub use hub::{Hub, HubOverrides, WorkerAttachment};
pub use queue::{QueueStats, WorkQueue};
pub use router::{GroupAction, LaunchStrategy, RoleRouter};
pub use traits::{DistributionSource, PathDistribution, WorkerContext, WorkerRunner};
pub use types::{HubConfig, Role, WorkItem, WorkSource, WorkerConfig};
