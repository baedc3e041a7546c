use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use botfleet::cli::{role_table, Cli, Commands};
use botfleet::{AppConfig, ConfigDiscovery, OrchestrationResult, OrchestrationRoot, QueueWorker};

mod main_runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Roles)) {
        main_runtime::init_logging_simple();
        print!("{}", role_table());
        return Ok(());
    }

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    main_runtime::init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            warn!("Invalid configuration: {}", e);
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    let groups = match &cli.command {
        Some(Commands::Single { role, config_file }) => {
            info!("Starting up single-worker environment from provided arguments.");
            vec![ConfigDiscovery::single(role, config_file)?]
        }
        _ => {
            info!("Starting up multi-worker environment.");
            ConfigDiscovery::new(config.discovery.clone()).discover_all()
        }
    };

    let cancel = CancellationToken::new();
    let listener = main_runtime::spawn_shutdown_listener(cancel.clone());
    let runner = Arc::new(QueueWorker::new(&config.worker));
    let root = OrchestrationRoot::new(&config, runner, cancel.clone());

    let result = root.run(groups).await;
    cancel.cancel();
    let _ = listener.await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &result {
            OrchestrationResult::NothingToDo => println!("No workers started. Verify folder configs."),
            OrchestrationResult::Completed(summary) => print!("{}", summary),
        }
    }

    println!("No workers are currently running.");
    Ok(())
}
