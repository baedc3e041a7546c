//! Core types shared by the hub, supervisor and coordinator

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Behavioral category of a worker group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Inert role; also what unrecognized identifiers resolve to
    Idle,
    /// Hub-bound workers trading with random partners
    SurpriseTrade,
    /// Hub-bound workers trading over link codes
    LinkTrade,
    /// Stand-alone workers, no shared hub
    EggHunt,
}

impl Role {
    /// Roles that have a discovery directory, in launch order
    pub const DISCOVERABLE: [Role; 3] = [Role::SurpriseTrade, Role::LinkTrade, Role::EggHunt];

    /// Directory holding this role's worker configs
    pub fn directory(&self) -> Option<&'static str> {
        match self {
            Role::Idle => None,
            Role::SurpriseTrade => Some("Surprise"),
            Role::LinkTrade => Some("LinkCode"),
            Role::EggHunt => Some("ShinyEgg"),
        }
    }

    /// Resolve a role from a directory name or snake_case name.
    ///
    /// Unrecognized identifiers resolve to [`Role::Idle`].
    pub fn from_identifier(identifier: &str) -> Self {
        let identifier = identifier.trim();
        Role::DISCOVERABLE
            .into_iter()
            .find(|role| {
                role.directory()
                    .is_some_and(|dir| dir.eq_ignore_ascii_case(identifier))
                    || role.as_str().eq_ignore_ascii_case(identifier)
            })
            .unwrap_or(Role::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Idle => "idle",
            Role::SurpriseTrade => "surprise_trade",
            Role::LinkTrade => "link_trade",
            Role::EggHunt => "egg_hunt",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One worker's configuration record: an ordered list of text fields.
///
/// Field semantics belong to the worker, except index 3 which names the
/// distribution source used by the queue filler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Where the record was loaded from, used as the worker's identity
    pub origin: String,
    fields: Vec<String>,
}

impl WorkerConfig {
    pub const DISTRIBUTION_FIELD: usize = 3;

    pub fn new(origin: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            origin: origin.into(),
            fields,
        }
    }

    /// Build a config from raw file content, one field per line
    pub fn from_text(origin: impl Into<String>, text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let fields = text
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self::new(origin, fields)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Path of the random distribution source, if the record declares one
    pub fn distribution_path(&self) -> Option<&Path> {
        self.field(Self::DISTRIBUTION_FIELD)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Path::new)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Settings shared by every worker attached to one hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    pub min_code: i32,
    pub max_code: i32,
}

impl HubConfig {
    pub const DEFAULT_MIN_CODE: i32 = 8180;
    pub const DEFAULT_MAX_CODE: i32 = 8199;

    pub fn is_valid(&self) -> bool {
        self.min_code <= self.max_code
    }

    /// Pick a code uniformly from `[min_code, max_code]`
    pub fn random_code<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.min_code..=self.max_code)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            min_code: Self::DEFAULT_MIN_CODE,
            max_code: Self::DEFAULT_MAX_CODE,
        }
    }
}

/// Where a work item came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkSource {
    /// External demand, identified by whoever asked for it
    Real { requester: String },
    /// Filler work injected while the queue was empty
    Synthetic { distribution: PathBuf },
}

/// A unit of demand placed into a hub's queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub item_id: Uuid,
    pub source: WorkSource,
    /// Trade code within the hub's configured range
    pub code: i32,
    /// Opaque payload, e.g. the distribution candidate to hand out
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn real(requester: impl Into<String>, code: i32, payload: impl Into<String>) -> Self {
        Self::with_source(
            WorkSource::Real {
                requester: requester.into(),
            },
            code,
            payload,
        )
    }

    pub fn synthetic(distribution: impl Into<PathBuf>, code: i32, payload: impl Into<String>) -> Self {
        Self::with_source(
            WorkSource::Synthetic {
                distribution: distribution.into(),
            },
            code,
            payload,
        )
    }

    fn with_source(source: WorkSource, code: i32, payload: impl Into<String>) -> Self {
        Self {
            item_id: Uuid::new_v4(),
            source,
            code,
            payload: payload.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.source, WorkSource::Synthetic { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_identifier() {
        assert_eq!(Role::from_identifier("Surprise"), Role::SurpriseTrade);
        assert_eq!(Role::from_identifier("linkcode"), Role::LinkTrade);
        assert_eq!(Role::from_identifier("egg_hunt"), Role::EggHunt);
        assert_eq!(Role::from_identifier(" ShinyEgg "), Role::EggHunt);
        // 未知角色 → Idle
        assert_eq!(Role::from_identifier("Dredge"), Role::Idle);
        assert_eq!(Role::from_identifier(""), Role::Idle);
    }

    #[test]
    fn test_worker_config_fields() {
        let config = WorkerConfig::from_text("bot1.txt", "192.168.0.10\r\n6000\n0\n./dist/A\n");
        assert_eq!(config.len(), 4);
        assert_eq!(config.field(0), Some("192.168.0.10"));
        assert_eq!(config.distribution_path(), Some(Path::new("./dist/A")));

        let short = WorkerConfig::from_text("bot2.txt", "10.0.0.1\n6000");
        assert_eq!(short.distribution_path(), None);

        let blank = WorkerConfig::new("bot3.txt", vec![String::new(); 4]);
        assert_eq!(blank.distribution_path(), None);
    }

    #[test]
    fn test_worker_config_strips_bom() {
        let config = WorkerConfig::from_text("bot1.txt", "\u{feff}10.0.0.1\r\n6000\r\n");
        assert_eq!(config.field(0), Some("10.0.0.1"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_random_code_within_bounds() {
        let config = HubConfig {
            min_code: 100,
            max_code: 105,
        };
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let code = config.random_code(&mut rng);
            assert!((100..=105).contains(&code));
        }

        let fixed = HubConfig {
            min_code: 7,
            max_code: 7,
        };
        assert_eq!(fixed.random_code(&mut rng), 7);
    }

    #[test]
    fn test_work_item_source() {
        assert!(!WorkItem::real("viewer-42", 8181, "request").is_synthetic());
        assert!(WorkItem::synthetic("./dist/A", 8181, "a.pk8").is_synthetic());
    }
}
