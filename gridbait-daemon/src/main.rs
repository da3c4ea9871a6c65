use anyhow::Result;
use clap::Parser;

use gridbait_core::config::GridbaitConfig;
use gridbait_daemon::cli::DaemonCli;
use gridbait_daemon::logging;
use gridbait_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = GridbaitConfig::load(&cli.config).await.map_err(|e| {
        anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e)
    })?;

    // CLI overrides take precedence over file and environment
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    if let Some(pid_file) = &cli.pid_file {
        config.general.pid_file = pid_file.clone();
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "gridbait-daemon starting"
    );

    if cli.backfill {
        return run_backfill(&config).await;
    }

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("gridbait-daemon shut down");
    Ok(())
}

/// One-shot backfill mode: replay the entire event log through the
/// relay once, overwrite the committed offset, and exit.
async fn run_backfill(config: &GridbaitConfig) -> Result<()> {
    use gridbait_relay::config::RelayConfig;
    use gridbait_relay::relay::{CycleOutcome, RelayLoop};

    let relay_config = RelayConfig::from_core(&config.relay, &config.general.device_id);
    let mut relay = RelayLoop::new(relay_config)
        .map_err(|e| anyhow::anyhow!("failed to build relay: {}", e))?;

    match relay
        .backfill()
        .await
        .map_err(|e| anyhow::anyhow!("backfill failed: {}", e))?
    {
        CycleOutcome::NotReady => {
            tracing::warn!("event log does not exist, nothing to backfill");
        }
        CycleOutcome::NoGrowth => {
            tracing::info!("event log is empty, nothing to backfill");
        }
        CycleOutcome::Processed {
            lines,
            dropped,
            delivered,
            failed,
            committed_offset,
        } => {
            tracing::info!(
                lines,
                dropped,
                delivered,
                failed,
                committed_offset,
                "backfill complete"
            );
        }
    }

    Ok(())
}
