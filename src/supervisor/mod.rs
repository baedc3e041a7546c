//! Supervisor Layer for worker and filler tasks
//!
//! - Worker supervisor: one task per worker config, bound to its group's hub
//! - Queue filler: keeps a hub's queue populated while demand is absent

pub mod filler;
pub mod worker;

pub use filler::{FillerReport, FillerStopReason, QueueFiller};
pub use worker::{WorkerHandle, WorkerSupervisor};
