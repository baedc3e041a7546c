use thiserror::Error;

/// Main error type for the launcher
#[derive(Error, Debug)]
pub enum FleetError {
    /// Malformed hub override file or an inverted code range.
    #[error("Hub configuration error: {0}")]
    HubConfig(String),

    // Discovery errors
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Filler distribution source unreadable or empty.
    #[error("Distribution source error: {path} - {reason}")]
    DistributionSource { path: String, reason: String },

    // Worker errors
    #[error("Worker startup failed: {worker} - {reason}")]
    WorkerStartup { worker: String, reason: String },

    #[error("Worker task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Short category label used in orchestration reports.
    pub fn category(&self) -> &'static str {
        match self {
            FleetError::HubConfig(_) => "config",
            FleetError::UnknownRole(_) => "discovery",
            FleetError::DistributionSource { .. } => "distribution_source",
            FleetError::WorkerStartup { .. } => "worker_startup",
            FleetError::Join(_) => "worker_aborted",
            FleetError::Io(_) => "io",
        }
    }

    pub(crate) fn worker_startup(worker: impl Into<String>, reason: impl Into<String>) -> Self {
        FleetError::WorkerStartup {
            worker: worker.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for FleetError
pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::HubConfig("min_code 10 > max_code 5".to_string());
        assert_eq!(
            err.to_string(),
            "Hub configuration error: min_code 10 > max_code 5"
        );

        let err = FleetError::worker_startup("LinkCode/bot1.txt", "missing port");
        assert_eq!(
            err.to_string(),
            "Worker startup failed: LinkCode/bot1.txt - missing port"
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(FleetError::HubConfig(String::new()).category(), "config");
        assert_eq!(
            FleetError::DistributionSource {
                path: "dist".into(),
                reason: "empty".into()
            }
            .category(),
            "distribution_source"
        );
        assert_eq!(FleetError::UnknownRole("idle".into()).category(), "discovery");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(FleetError::from(io).category(), "io");
    }
}
