//! Config Discovery - per-role directories of worker config files
//!
//! Each discoverable role owns a directory under the discovery root
//! (`Surprise/`, `LinkCode/`, `ShinyEgg/`). Every top-level file named
//! `<prefix>*.<ext>` in it is one worker config, one field per line.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::error::{FleetError, Result};
use crate::platform::{Role, WorkerConfig};

/// Worker configs found for one role
#[derive(Debug, Clone)]
pub struct DiscoveredGroup {
    pub role: Role,
    pub directory: PathBuf,
    pub configs: Vec<WorkerConfig>,
}

impl DiscoveredGroup {
    pub fn new(role: Role, directory: impl Into<PathBuf>, configs: Vec<WorkerConfig>) -> Self {
        Self {
            role,
            directory: directory.into(),
            configs,
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    config: DiscoveryConfig,
}

impl ConfigDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Discover every known role.
    ///
    /// A role whose directory cannot be read contributes an empty group.
    pub fn discover_all(&self) -> Vec<DiscoveredGroup> {
        Role::DISCOVERABLE
            .into_iter()
            .map(|role| {
                self.discover_role(role).unwrap_or_else(|e| {
                    warn!("Discovery for {} failed: {}", role, e);
                    DiscoveredGroup::new(role, self.role_directory(role), Vec::new())
                })
            })
            .collect()
    }

    pub fn role_directory(&self, role: Role) -> PathBuf {
        match role.directory() {
            Some(dir) => self.config.root.join(dir),
            None => self.config.root.clone(),
        }
    }

    /// Load all config files of one role, in file name order
    pub fn discover_role(&self, role: Role) -> Result<DiscoveredGroup> {
        if role.directory().is_none() {
            return Err(FleetError::UnknownRole(role.to_string()));
        }
        let directory = self.role_directory(role);

        if !directory.is_dir() {
            if !self.config.create_missing {
                debug!("Role directory {} does not exist", directory.display());
                return Ok(DiscoveredGroup::new(role, directory, Vec::new()));
            }
            std::fs::create_dir_all(&directory)?;
            info!("Created role directory {}", directory.display());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.matches(path))
            .collect();
        files.sort();

        let configs: Vec<WorkerConfig> = files
            .iter()
            .filter_map(|path| match Self::load_config(path) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Skipping unreadable config {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        if !configs.is_empty() {
            info!(
                "Found {} config(s) in {}. Creating worker(s)...",
                configs.len(),
                directory.display()
            );
        }
        Ok(DiscoveredGroup::new(role, directory, configs))
    }

    /// Build a single-worker group from an explicit role identifier and file
    pub fn single(identifier: &str, path: &Path) -> Result<DiscoveredGroup> {
        let role = Role::from_identifier(identifier);
        if role == Role::Idle {
            warn!("Role {:?} is not recognized, worker will be inert", identifier);
        }
        let config = Self::load_config(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(DiscoveredGroup::new(role, directory, vec![config]))
    }

    pub fn load_config(path: &Path) -> Result<WorkerConfig> {
        let text = std::fs::read_to_string(path)?;
        Ok(WorkerConfig::from_text(path.display().to_string(), &text))
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        name.starts_with(&self.config.file_prefix)
            && extension.eq_ignore_ascii_case(&self.config.file_extension)
    }
}
