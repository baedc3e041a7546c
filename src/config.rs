use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub filler: FillerConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Base directory holding one sub-directory per role
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Config files must start with this prefix (e.g., "bot1.txt")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Config file extension, without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Create empty role directories that do not exist yet
    #[serde(default = "default_true")]
    pub create_missing: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "bot".to_string()
}

fn default_file_extension() -> String {
    "txt".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            create_missing: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Lowest trade code handed out by the hub
    #[serde(default = "default_min_code")]
    pub min_code: i32,
    /// Highest trade code handed out by the hub
    #[serde(default = "default_max_code")]
    pub max_code: i32,
    /// Optional two-line override file (min code, max code)
    #[serde(default = "default_override_file")]
    pub override_file: PathBuf,
}

fn default_min_code() -> i32 {
    HubConfig::DEFAULT_MIN_CODE
}

fn default_max_code() -> i32 {
    HubConfig::DEFAULT_MAX_CODE
}

fn default_override_file() -> PathBuf {
    PathBuf::from("hub.txt")
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            min_code: default_min_code(),
            max_code: default_max_code(),
            override_file: default_override_file(),
        }
    }
}

impl HubSettings {
    /// Initial hub configuration before the override file is applied
    pub fn initial(&self) -> HubConfig {
        HubConfig {
            min_code: self.min_code,
            max_code: self.max_code,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillerConfig {
    /// Delay between queue depth checks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Delay after a distribution source with no candidates in milliseconds.
    /// Unreadable sources are retried at `poll_interval_ms`.
    #[serde(default = "default_empty_backoff")]
    pub empty_source_backoff_ms: u64,
}

fn default_poll_interval() -> u64 {
    500
}

fn default_empty_backoff() -> u64 {
    5000
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            empty_source_backoff_ms: default_empty_backoff(),
        }
    }
}

impl FillerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn empty_source_backoff(&self) -> Duration {
        Duration::from_millis(self.empty_source_backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// Simulated time spent on each work item by the built-in worker
    #[serde(default = "default_item_duration")]
    pub item_duration_ms: u64,
}

fn default_item_duration() -> u64 {
    1000
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            item_duration_ms: default_item_duration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("filler.poll_interval_ms", 500)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BOTFLEET_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (BOTFLEET_HUB__MIN_CODE, etc.)
            .add_source(
                Environment::with_prefix("BOTFLEET")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.hub.min_code > self.hub.max_code {
            errors.push(format!(
                "hub.min_code ({}) must not exceed hub.max_code ({})",
                self.hub.min_code, self.hub.max_code
            ));
        }

        if self.filler.poll_interval_ms == 0 {
            errors.push("filler.poll_interval_ms must be positive".to_string());
        }

        if self.discovery.file_prefix.trim().is_empty() {
            errors.push("discovery.file_prefix must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
