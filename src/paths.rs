//! Application path resolution for portable and installed modes.
//!
//! - **Explicit**: `--config <path>` wins; logs go next to that file. Not
//!   treated as portable.
//! - **Portable**: a `.portable` marker next to the executable keeps the
//!   config, sounds and logs beside it.
//! - **Installed** (default): data lives in the platform data directory
//!   (`%APPDATA%\cStrafe`, `~/.local/share/cStrafe`).
//!
//! Sound paths in the config are relative to the config directory.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "cStrafe";

const CONFIG_FILE: &str = "config.yaml";

/// Application paths for config and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether data lives next to the executable
    pub is_portable: bool,
}

impl AppPaths {
    /// Resolve paths from the CLI config argument and the environment.
    ///
    /// Called before logging is initialized.
    pub fn resolve(config_arg: Option<&str>) -> Self {
        if let Some(config) = config_arg {
            return Self::beside(PathBuf::from(config), false);
        }

        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::detect(&exe_dir, dirs::data_dir())
    }

    /// Portable if the marker exists, else installed under `data_dir`
    pub fn detect(exe_dir: &Path, data_dir: Option<PathBuf>) -> Self {
        if exe_dir.join(".portable").exists() {
            return Self::beside(exe_dir.join(CONFIG_FILE), true);
        }

        let app_data = data_dir
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no data directory, falling back to exe dir");
                exe_dir.to_path_buf()
            })
            .join(APP_NAME);

        Self::beside(app_data.join(CONFIG_FILE), false)
    }

    fn beside(config: PathBuf, is_portable: bool) -> Self {
        let base = config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            logs_dir: base.join("logs"),
            config,
            is_portable,
        }
    }

    /// Directory holding the config file; base for relative sound paths
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the logs and config directories if missing
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [self.logs_dir.clone(), self.base_dir()] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config_keeps_logs_beside_it() {
        let paths = AppPaths::resolve(Some("profiles/cs2.yaml"));
        assert_eq!(paths.config, PathBuf::from("profiles/cs2.yaml"));
        assert_eq!(paths.logs_dir, PathBuf::from("profiles/logs"));
        assert_eq!(paths.base_dir(), PathBuf::from("profiles"));
        assert!(!paths.is_portable);
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let paths = AppPaths::resolve(Some("config.yaml"));
        assert_eq!(paths.base_dir(), PathBuf::from("."));
        assert_eq!(paths.logs_dir, PathBuf::from("./logs"));
    }

    #[test]
    fn test_portable_marker() {
        let exe = TempDir::new().unwrap();
        std::fs::write(exe.path().join(".portable"), "").unwrap();

        let paths = AppPaths::detect(exe.path(), Some(PathBuf::from("/unused")));
        assert!(paths.is_portable);
        assert_eq!(paths.config, exe.path().join("config.yaml"));
    }

    #[test]
    fn test_installed_mode_uses_data_dir() {
        let exe = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();

        let paths = AppPaths::detect(exe.path(), Some(data.path().to_path_buf()));
        assert!(!paths.is_portable);
        assert_eq!(paths.config, data.path().join("cStrafe").join("config.yaml"));
        assert_eq!(paths.logs_dir, data.path().join("cStrafe").join("logs"));

        paths.ensure_directories().unwrap();
        assert!(paths.logs_dir.is_dir());
    }
}
