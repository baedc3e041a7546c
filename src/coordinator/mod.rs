//! Orchestration Coordinator
//!
//! Turns discovered worker groups into running tasks: one hub and one queue
//! filler per hub-bound group, one task per worker, all awaited as a unit.

pub mod orchestrator;
pub mod report;

pub use orchestrator::{OrchestrationRoot, SourceFactory};
pub use report::{FailureRecord, GroupReport, OrchestrationResult, OrchestrationSummary};
