//! Config file watcher for live key-binding and volume reloads

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Delay between the first change notification and the reload
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the config file and yields each successfully reloaded config
///
/// The parent directory is watched rather than the file itself so editors
/// that save by renaming a temp file over the existing one are still picked up.
/// A burst of change events produces a single reload.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Load the config at `config_path` and start watching it
    pub async fn new(config_path: String) -> Result<(Self, Arc<AppConfig>)> {
        let (tx, rx) = mpsc::channel(10);

        let initial_config = AppConfig::load_or_create(&config_path)
            .await
            .context("Failed to load initial config")?;
        let initial_config = Arc::new(initial_config);

        let target = PathBuf::from(&config_path);
        let file_name = target
            .file_name()
            .map(|n| n.to_os_string())
            .with_context(|| format!("Config path has no file name: {}", config_path))?;
        let watch_dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // notify callbacks run on their own OS thread, outside the runtime
        let runtime_handle = tokio::runtime::Handle::current();
        let reload_pending = Arc::new(AtomicBool::new(false));

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Watch error: {}", e);
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            if !event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                return;
            }
            if reload_pending.swap(true, Ordering::AcqRel) {
                return;
            }
            debug!("Config file changed: {:?}", event.paths);

            let config_path = config_path_for(&event, &file_name);
            let tx = tx.clone();
            let reload_pending = Arc::clone(&reload_pending);

            runtime_handle.spawn(async move {
                // Let the writer finish before reading
                tokio::time::sleep(DEBOUNCE).await;
                reload_pending.store(false, Ordering::Release);

                match AppConfig::load(&config_path).await {
                    Ok(new_config) => {
                        info!("Configuration reloaded from {}", config_path);
                        if let Err(e) = tx.send(new_config).await {
                            error!("Failed to send config update: {}", e);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to reload config (keeping old config): {:#}", e);
                    }
                }
            });
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", watch_dir.display()))?;

        info!("Config file watcher started for: {}", target.display());

        Ok((
            Self {
                _watcher: watcher,
                rx,
            },
            initial_config,
        ))
    }

    /// Wait for the next config update
    ///
    /// Returns None once the watcher has been dropped.
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

/// Path of the changed config file as reported by the event
fn config_path_for(event: &Event, file_name: &std::ffi::OsStr) -> String {
    event
        .paths
        .iter()
        .find(|p| p.file_name() == Some(file_name))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| Path::new(file_name).to_string_lossy().to_string())
}
