//! Worker implementations shipped with the launcher

mod queue_worker;

pub use queue_worker::{Endpoint, QueueWorker};
