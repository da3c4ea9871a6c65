//! Module orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `gridbait-daemon`.
//! It loads configuration, builds enabled modules, manages
//! startup/shutdown ordering, and runs the main event loop.
//!
//! Decoys and the relay do not exchange messages in-process; their only
//! shared state is the event log file. Registration order is decoys
//! first, relay second, and shutdown runs in reverse so the relay gets
//! a final chance to drain lines the decoys wrote on the way down.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use gridbait_core::config::GridbaitConfig;

use crate::health::DaemonHealth;
use crate::metrics_server;
use crate::modules::{self, ModuleRegistry};

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: GridbaitConfig,
    /// Registry of all modules (ordered for start/stop).
    registry: ModuleRegistry,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from a file and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = GridbaitConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the metrics recorder
    /// cannot be installed, any enabled module fails to initialize, or
    /// no module is enabled at all.
    pub async fn build_from_config(config: GridbaitConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Recorder must exist before modules emit their first metric
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let mut registry = ModuleRegistry::new();

        // Registration order: decoys first, relay second
        if let Some(handle) = modules::decoy::init(&config)? {
            registry.register(handle);
        }
        if let Some(handle) = modules::relay::init(&config)? {
            registry.register(handle);
        }

        if registry.count() == 0 {
            return Err(anyhow::anyhow!(
                "no modules enabled; enable [decoy] or [relay] in the configuration"
            ));
        }

        tracing::info!(total_modules = registry.count(), "orchestrator initialized");

        if config.metrics.enabled {
            record_daemon_metrics(registry.count());
        }

        Ok(Self {
            config,
            registry,
            start_time: Instant::now(),
        })
    }

    /// Start all enabled modules and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        if let Some(path) = self.pid_file_path() {
            write_pid_file(path)?;
        }

        tracing::info!("starting all modules");
        if let Err(e) = self.registry.start_all().await {
            // Rollback: stop any modules that did come up
            tracing::warn!("startup failed, rolling back already-started modules");
            if let Err(stop_err) = self.registry.stop_all().await {
                tracing::error!(
                    startup_error = %e,
                    rollback_error = %stop_err,
                    "rollback also failed during startup failure cleanup"
                );
            }
            if let Some(path) = self.pid_file_path() {
                remove_pid_file(path);
            }
            return Err(e);
        }

        // Keep the uptime gauge fresh for Prometheus scrapes
        let uptime_task = self
            .config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(self.start_time));

        tracing::info!("entering main event loop");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        if let Some(task) = uptime_task {
            task.abort();
        }

        tracing::info!("stopping all modules");
        let result = self.registry.stop_all().await;

        if let Some(path) = self.pid_file_path() {
            remove_pid_file(path);
        }

        result
    }

    /// Current aggregated health report.
    pub async fn health(&self) -> DaemonHealth {
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            use gridbait_core::metrics as m;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth::new(uptime_secs, self.registry.module_health().await)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &GridbaitConfig {
        &self.config
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.registry.count()
    }

    fn pid_file_path(&self) -> Option<&Path> {
        if self.config.general.pid_file.is_empty() {
            None
        } else {
            Some(Path::new(&self.config.general.pid_file))
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Claim the PID file for this daemon instance.
///
/// Creation uses `create_new` so two racing daemons cannot both claim
/// the file. A leftover file from a crashed instance has to be removed
/// by the operator; guessing at staleness here would let two live
/// daemons fight over the event log offset.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .mode(0o700)
                .recursive(true)
                .create(parent)?;
        }
        #[cfg(not(unix))]
        fs::create_dir_all(parent)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let holder = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists (pid {}); is another gridbait-daemon running?",
                path.display(),
                holder.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Symlinks and other special files are not acceptable PID files
    if !file.metadata()?.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    writeln!(file, "{}", std::process::id())?;

    tracing::info!(pid = std::process::id(), path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on shutdown. Best effort; failure only warns.
fn remove_pid_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "PID file removed"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file"),
    }
}

/// Record daemon-level metrics once at initialization.
fn record_daemon_metrics(module_count: usize) {
    use gridbait_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DAEMON_MODULES_REGISTERED).set(module_count as f64);
}

/// Spawn a background task that refreshes the uptime gauge every 10s.
fn spawn_uptime_updater(start_time: Instant) -> tokio::task::JoinHandle<()> {
    use gridbait_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(start_time.elapsed().as_secs() as f64);
        }
    })
}
