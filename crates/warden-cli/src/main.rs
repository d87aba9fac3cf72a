//! Entry point of the `warden` lock harness.

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};
use warden_cli::model::config::{Cli, Configuration};
use warden_cli::{scenario, startup};
use warden_lock::LockManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let configuration = Configuration::new().context("failed to load configuration")?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let store_config = configuration.store_config()?;
    let settings = configuration.scenario_settings()?;

    info!(
        process_id = %cli.process_id,
        mode = %cli.mode,
        backend = %store_config.backend,
        url = %store_config.redacted_url(),
        "Warden starting"
    );

    let store = warden_store::connect(&store_config)
        .await
        .with_context(|| format!("failed to connect to {} store", store_config.backend))?;
    let manager = LockManager::new(store);

    let report = scenario::run(&manager, cli.mode, &cli.process_id, &settings)
        .await
        .with_context(|| format!("{} exercise failed", cli.mode))?;

    let violations = report.violations();
    if !violations.is_empty() {
        for violation in &violations {
            error!(process_id = %cli.process_id, "{}", violation);
        }
        bail!(
            "{} exercise violated lock guarantees: {}",
            cli.mode,
            violations.join("; ")
        );
    }

    info!(
        process_id = %cli.process_id,
        mode = %cli.mode,
        acquired = report.acquired,
        "Exercise finished"
    );
    Ok(())
}
