//! Logging initialization for gridbait-daemon.
//!
//! The daemon logs through `tracing`; this module wires the global
//! subscriber from the `[general]` config section. `RUST_LOG` wins
//! over the configured level so operators can raise verbosity for a
//! single run without touching the config file.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use gridbait_core::config::GeneralConfig;

/// Output format for daemon logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    /// Machine-parseable JSON lines, the production default.
    Json,
    /// Human-readable output for interactive debugging.
    Pretty,
}

impl LogFormat {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            )),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let format = LogFormat::parse(&config.log_format)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let init_result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    init_result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}
