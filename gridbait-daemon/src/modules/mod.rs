//! Module wiring for the daemon.
//!
//! Each long-running subsystem (the decoy listeners, the alert relay)
//! is wrapped in a [`ModuleHandle`] and driven through the shared
//! [`Pipeline`] trait, so the orchestrator can start, stop, and probe
//! them without knowing their concrete types.

pub mod decoy;
pub mod relay;

use gridbait_core::pipeline::{HealthStatus, Pipeline};

use crate::health::ModuleHealth;

/// One registered daemon module.
pub struct ModuleHandle {
    /// Stable module name used in logs and health reports.
    pub name: &'static str,
    /// Whether the module is enabled in configuration.
    pub enabled: bool,
    /// Lifecycle implementation behind the shared trait.
    pub pipeline: Box<dyn Pipeline>,
}

impl ModuleHandle {
    pub fn new(name: &'static str, enabled: bool, pipeline: Box<dyn Pipeline>) -> Self {
        Self {
            name,
            enabled,
            pipeline,
        }
    }

    /// Probe the module.
    ///
    /// A disabled module counts as healthy; it is not expected to run.
    pub async fn health_check(&self) -> HealthStatus {
        if self.enabled {
            self.pipeline.health_check().await
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Ordered collection of daemon modules.
///
/// Start order is registration order; stop order is the reverse, so
/// the relay (registered after the decoys) stops last and can drain
/// what the decoys wrote on the way down.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleHandle>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: ModuleHandle) {
        self.modules.push(handle);
    }

    /// Start every enabled module in registration order.
    ///
    /// Stops at the first failure and leaves earlier modules running;
    /// callers that need all-or-nothing startup follow up with
    /// [`stop_all`](Self::stop_all).
    pub async fn start_all(&mut self) -> anyhow::Result<()> {
        for module in self.modules.iter_mut().filter(|m| m.enabled) {
            module
                .pipeline
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("module '{}' failed to start: {}", module.name, e))?;
            tracing::info!(module = module.name, "module started");
        }
        Ok(())
    }

    /// Stop every enabled module in reverse registration order.
    ///
    /// Keeps going past individual failures so one stuck module cannot
    /// prevent the rest from shutting down.
    pub async fn stop_all(&mut self) -> anyhow::Result<()> {
        let mut failed: Vec<&'static str> = Vec::new();

        for module in self.modules.iter_mut().rev().filter(|m| m.enabled) {
            match module.pipeline.stop().await {
                Ok(()) => tracing::info!(module = module.name, "module stopped"),
                Err(e) => {
                    tracing::error!(module = module.name, error = %e, "failed to stop module");
                    failed.push(module.name);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "modules failed to stop cleanly: {}",
                failed.join(", ")
            ))
        }
    }

    /// Collect a health report entry for every registered module.
    pub async fn module_health(&self) -> Vec<ModuleHealth> {
        let mut report = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            report.push(ModuleHealth {
                name: module.name.to_owned(),
                enabled: module.enabled,
                status: module.health_check().await,
            });
        }
        report
    }

    pub fn count(&self) -> usize {
        self.modules.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.modules.iter().filter(|m| m.enabled).count()
    }
}
