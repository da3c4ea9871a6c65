//! Relay module initialization.
//!
//! Converts the `[relay]` section of `GridbaitConfig` into the relay's
//! own config, builds a `RelayService`, and wraps it in a
//! `ModuleHandle`. The relay shares nothing with the decoys except the
//! event log file on disk.

use anyhow::Result;

use gridbait_core::config::GridbaitConfig;
use gridbait_relay::config::RelayConfig;
use gridbait_relay::relay::RelayService;

use super::ModuleHandle;

/// Initialize the relay module.
///
/// Returns `None` if the relay is disabled in configuration.
pub fn init(config: &GridbaitConfig) -> Result<Option<ModuleHandle>> {
    if !config.relay.enabled {
        tracing::info!("relay disabled in configuration");
        return Ok(None);
    }

    tracing::info!("initializing relay");

    let relay_config = RelayConfig::from_core(&config.relay, &config.general.device_id);
    let service = RelayService::new(relay_config)
        .map_err(|e| anyhow::anyhow!("failed to build relay: {}", e))?;

    Ok(Some(ModuleHandle::new("relay", true, Box::new(service))))
}
