//! Decoy module initialization.
//!
//! Converts the `[decoy]` section of `GridbaitConfig` into the decoy
//! crate's config (parsing bind addresses up front), builds a
//! `DecoySet`, and wraps it in a `ModuleHandle`.

use anyhow::Result;

use gridbait_core::config::GridbaitConfig;
use gridbait_decoy::DecoySet;

use super::ModuleHandle;

/// Initialize the decoy module.
///
/// Returns `None` if the decoys are disabled in configuration.
pub fn init(config: &GridbaitConfig) -> Result<Option<ModuleHandle>> {
    if !config.decoy.enabled {
        tracing::info!("decoys disabled in configuration");
        return Ok(None);
    }

    tracing::info!(
        listeners = config.decoy.listeners.len(),
        "initializing decoys"
    );

    let set = DecoySet::from_core(&config.decoy)
        .map_err(|e| anyhow::anyhow!("failed to build decoy set: {}", e))?;

    Ok(Some(ModuleHandle::new("decoy", true, Box::new(set))))
}
