//! Daemon-wide health reporting.
//!
//! Each module answers `health_check()` on its own; this module folds
//! those answers into one [`DaemonHealth`] report. The daemon is only
//! as healthy as its worst enabled module.

use serde::Serialize;

use gridbait_core::pipeline::HealthStatus;

/// Health report for the whole daemon, serializable for operators.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Worst status among enabled modules.
    pub status: HealthStatus,
    /// Seconds since the daemon started.
    pub uptime_secs: u64,
    /// Per-module detail backing the overall status.
    pub modules: Vec<ModuleHealth>,
}

impl DaemonHealth {
    /// Build a report from per-module results, deriving the overall
    /// status via [`aggregate_status`].
    pub fn new(uptime_secs: u64, modules: Vec<ModuleHealth>) -> Self {
        let status = aggregate_status(&modules);
        Self {
            status,
            uptime_secs,
            modules,
        }
    }
}

/// Health entry for one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Module name ("decoy", "relay").
    pub name: String,
    /// Whether the module is enabled in configuration.
    pub enabled: bool,
    /// Latest probe result.
    pub status: HealthStatus,
}

/// Fold per-module statuses into a single daemon status.
///
/// Unhealthy outranks Degraded outranks Healthy. When any module is
/// unhealthy, only the unhealthy reasons are reported; degraded
/// reasons are secondary at that point. Disabled modules never affect
/// the result.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let mut degraded: Vec<String> = Vec::new();
    let mut unhealthy: Vec<String> = Vec::new();

    for module in modules.iter().filter(|m| m.enabled) {
        match &module.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => degraded.push(format!("{}: {}", module.name, reason)),
            HealthStatus::Unhealthy(reason) => {
                unhealthy.push(format!("{}: {}", module.name, reason));
            }
        }
    }

    if !unhealthy.is_empty() {
        HealthStatus::Unhealthy(unhealthy.join("; "))
    } else if !degraded.is_empty() {
        HealthStatus::Degraded(degraded.join("; "))
    } else {
        HealthStatus::Healthy
    }
}
