//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by rename still trigger a reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Sections read once at startup. Edits to them are applied on restart only.
pub fn restart_required(running: &AppConfig, next: &AppConfig) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if running.listener != next.listener {
        sections.push("listener");
    }
    if running.console != next.console {
        sections.push("console");
    }
    if running.observability != next.observability {
        sections.push("observability");
    }
    // The console's API client and request deadline are built once.
    if next.console.enabled && running.timeouts != next.timeouts {
        sections.push("timeouts (console)");
    }
    sections
}

/// Reloads the configuration file on change and forwards valid configs.
pub struct ConfigWatcher {
    path: PathBuf,
    running: AppConfig,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// `running` is the config the process started with; reloads are
    /// compared against it to flag sections that need a restart.
    pub fn new(path: &Path, running: &AppConfig) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            running: running.clone(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = std::fs::canonicalize(&self.path).map_err(notify::Error::io)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let Self {
            running, update_tx, ..
        } = self;
        let file = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event)
                    if (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| p == &file) =>
                {
                    tracing::info!(path = ?file, "Config file changed, reloading");
                    match load_config(&file) {
                        Ok(next) => {
                            let pending = restart_required(&running, &next);
                            if !pending.is_empty() {
                                tracing::warn!(sections = ?pending, "Changed sections take effect after restart");
                            }
                            let _ = update_tx.send(next);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Reloaded config rejected, keeping current one");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
