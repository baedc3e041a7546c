use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::platform::{Role, RoleRouter};

#[derive(Parser, Debug)]
#[command(name = "botfleet")]
#[command(author = "Botfleet Team")]
#[command(version = "0.1.0")]
#[command(about = "Launch role-grouped workers sharing a trade hub", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <BOTFLEET_ENV>.toml)
    #[arg(short, long, default_value = "config", env = "BOTFLEET_CONFIG_DIR")]
    pub config: PathBuf,

    /// Print the final run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Discover configs in every role directory and launch all workers
    Run,
    /// Launch a single worker from one config file
    Single {
        /// Role identifier (Surprise, LinkCode, ShinyEgg or a role name)
        role: String,
        /// Worker config file
        config_file: PathBuf,
    },
    /// List known roles and how they are launched
    Roles,
}

/// Table of roles for the `roles` subcommand
pub fn role_table() -> String {
    let mut out = format!("{:<15} {:<10} {:<11} {}\n", "ROLE", "DIRECTORY", "STRATEGY", "HUB+FILLER");
    for role in [Role::SurpriseTrade, Role::LinkTrade, Role::EggHunt, Role::Idle] {
        let strategy = RoleRouter::strategy_for(role);
        out.push_str(&format!(
            "{:<15} {:<10} {:<11} {}\n",
            role.as_str(),
            role.directory().unwrap_or("-"),
            format!("{:?}", strategy),
            if strategy.uses_hub() { "yes" } else { "no" }
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let cli = Cli::parse_from(["botfleet", "single", "LinkCode", "bot1.txt"]);
        match cli.command {
            Some(Commands::Single { role, config_file }) => {
                assert_eq!(role, "LinkCode");
                assert_eq!(config_file, PathBuf::from("bot1.txt"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["botfleet", "--json"]);
        assert!(cli.command.is_none());
        assert!(cli.json);
    }

    #[test]
    fn test_role_table() {
        let table = role_table();
        assert!(table.contains("LinkCode"));
        assert!(table.lines().count() == 5);
    }
}
