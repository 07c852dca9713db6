use anyhow::Result;
use clap::Parser;

use contractor_onboarding::cli::commands::callbacks::{SignatureCommand, TrainingCommand};
use contractor_onboarding::cli::commands::dispatch::{DispatchCommand, ManualCommand};
use contractor_onboarding::cli::commands::session::{AdvanceCommand, CancelCommand};
use contractor_onboarding::cli::commands::status::{StatsCommand, StatusCommand};
use contractor_onboarding::cli::commands::sweep::SweepCommand;
use contractor_onboarding::cli::commands::{Command, Engine};
use contractor_onboarding::cli::{Cli, Commands};
use contractor_onboarding::{config, init_telemetry, shutdown_telemetry, OnboardingConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            OnboardingConfig::load_env_file()?;
            OnboardingConfig::load_from_file(path)?
        }
        None => config()?.clone(),
    };
    init_telemetry(&config.observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async { run(cli.command, &config).await });

    shutdown_telemetry();
    result
}

async fn run(command: Commands, config: &OnboardingConfig) -> Result<()> {
    let engine = Engine::open(config).await?;
    let mutates = command.mutates_state();

    match command {
        Commands::Dispatch { file } => DispatchCommand { file }.execute(&engine).await?,
        Commands::Manual { subject, role, actor } => {
            ManualCommand { subject, role, actor }.execute(&engine).await?
        }
        Commands::Signature { file } => SignatureCommand { file }.execute(&engine).await?,
        Commands::Training { file } => TrainingCommand { file }.execute(&engine).await?,
        Commands::Advance { session_id } => AdvanceCommand { session_id }.execute(&engine).await?,
        Commands::Cancel { session_id, actor, reason } => {
            CancelCommand { session_id, actor, reason }.execute(&engine).await?
        }
        Commands::Sweep => SweepCommand.execute(&engine).await?,
        Commands::Status { session_id, subject } => {
            StatusCommand { session_id, subject }.execute(&engine).await?
        }
        Commands::Stats { hours } => StatsCommand { hours }.execute(&engine).await?,
    }

    if mutates {
        engine.save().await?;
    }
    Ok(())
}
