//! Role Router - 角色到啟動策略的映射

use serde::Serialize;

use super::types::{Role, WorkerConfig};

/// How a discovered group gets launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStrategy {
    /// Shared hub plus a queue filler
    SharedHub,
    /// Independent workers, no shared state
    Standalone,
    /// Nothing is launched
    Inert,
}

impl LaunchStrategy {
    pub fn uses_hub(&self) -> bool {
        matches!(self, LaunchStrategy::SharedHub)
    }
}

/// Concrete action for one role-group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAction {
    SharedHub {
        role: Role,
        configs: Vec<WorkerConfig>,
    },
    Standalone {
        role: Role,
        configs: Vec<WorkerConfig>,
    },
    Inert {
        role: Role,
        ignored: usize,
    },
}

impl GroupAction {
    pub fn role(&self) -> Role {
        match self {
            GroupAction::SharedHub { role, .. }
            | GroupAction::Standalone { role, .. }
            | GroupAction::Inert { role, .. } => *role,
        }
    }

    pub fn strategy(&self) -> LaunchStrategy {
        match self {
            GroupAction::SharedHub { .. } => LaunchStrategy::SharedHub,
            GroupAction::Standalone { .. } => LaunchStrategy::Standalone,
            GroupAction::Inert { .. } => LaunchStrategy::Inert,
        }
    }
}

/// Role to launch strategy table
const ROUTES: [(Role, LaunchStrategy); 4] = [
    (Role::Idle, LaunchStrategy::Inert),
    (Role::SurpriseTrade, LaunchStrategy::SharedHub),
    (Role::LinkTrade, LaunchStrategy::SharedHub),
    (Role::EggHunt, LaunchStrategy::Standalone),
];

/// Stateless router from role to launch action
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleRouter;

impl RoleRouter {
    pub fn strategy_for(role: Role) -> LaunchStrategy {
        ROUTES
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, strategy)| *strategy)
            .unwrap_or(LaunchStrategy::Inert)
    }

    /// Map a role and its configs to the action that launches them
    pub fn route(role: Role, configs: Vec<WorkerConfig>) -> GroupAction {
        match Self::strategy_for(role) {
            LaunchStrategy::SharedHub => GroupAction::SharedHub { role, configs },
            LaunchStrategy::Standalone => GroupAction::Standalone { role, configs },
            LaunchStrategy::Inert => GroupAction::Inert {
                role,
                ignored: configs.len(),
            },
        }
    }

    /// Route by raw identifier (directory or role name)
    pub fn route_identifier(identifier: &str, configs: Vec<WorkerConfig>) -> GroupAction {
        Self::route(Role::from_identifier(identifier), configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs(n: usize) -> Vec<WorkerConfig> {
        (0..n)
            .map(|i| WorkerConfig::new(format!("bot{i}.txt"), vec![]))
            .collect()
    }

    #[test]
    fn test_route_table() {
        assert!(matches!(
            RoleRouter::route(Role::LinkTrade, configs(2)),
            GroupAction::SharedHub { configs, .. } if configs.len() == 2
        ));
        assert!(matches!(
            RoleRouter::route(Role::SurpriseTrade, configs(1)),
            GroupAction::SharedHub { .. }
        ));
        assert!(matches!(
            RoleRouter::route(Role::EggHunt, configs(1)),
            GroupAction::Standalone { .. }
        ));
        assert_eq!(
            RoleRouter::route(Role::Idle, configs(3)),
            GroupAction::Inert {
                role: Role::Idle,
                ignored: 3
            }
        );
    }

    #[test]
    fn test_unknown_identifier_is_inert() {
        let action = RoleRouter::route_identifier("Raid", configs(2));
        assert_eq!(action.strategy(), LaunchStrategy::Inert);
        assert_eq!(action.role(), Role::Idle);

        let action = RoleRouter::route_identifier("LinkCode", configs(0));
        assert_eq!(action.strategy(), LaunchStrategy::SharedHub);
    }

    #[test]
    fn test_every_role_has_route() {
        for role in [Role::Idle, Role::SurpriseTrade, Role::LinkTrade, Role::EggHunt] {
            assert!(ROUTES.iter().any(|(r, _)| *r == role));
        }
    }
}
