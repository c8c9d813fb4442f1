//! Configuration management for cStrafe
//!
//! Handles loading, validating, creating and hot-reloading the YAML
//! configuration file. Everything here belongs to the collaborators around
//! the engine (key bindings, sounds, HUD server); the grading thresholds are
//! not configurable.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::engine::timeline::{DEFAULT_REVERSAL_LOOKBACK_MS, DEFAULT_REVERSAL_POST_RELEASE_MS};
use crate::engine::ReversalWindow;

pub use watcher::ConfigWatcher;

/// Upper bound for either side of the reversal window
pub const MAX_REVERSAL_WINDOW_MS: u64 = 2000;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bindings: MovementBindings,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    #[serde(default)]
    pub volume_keys: VolumeKeyConfig,
    #[serde(default)]
    pub sounds: SoundConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Physical keys for the four movement directions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MovementBindings {
    #[serde(default = "default_forward")]
    pub forward: String,
    #[serde(default = "default_back")]
    pub back: String,
    #[serde(default = "default_left")]
    pub left: String,
    #[serde(default = "default_right")]
    pub right: String,
}

/// Application hotkeys
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HotkeyConfig {
    #[serde(default = "default_toggle_overlay")]
    pub toggle_overlay: String,
    #[serde(default = "default_terminate")]
    pub terminate: String,
    #[serde(default = "default_increase_size")]
    pub increase_size: String,
    #[serde(default = "default_decrease_size")]
    pub decrease_size: String,
}

/// Volume hotkeys (numpad by default)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VolumeKeyConfig {
    #[serde(default = "default_master_up")]
    pub master_up: String,
    #[serde(default = "default_master_down")]
    pub master_down: String,
    #[serde(default = "default_bad_up")]
    pub bad_up: String,
    #[serde(default = "default_bad_down")]
    pub bad_down: String,
    #[serde(default = "default_overlap_up")]
    pub overlap_up: String,
    #[serde(default = "default_overlap_down")]
    pub overlap_down: String,
    #[serde(default = "default_good_up")]
    pub good_up: String,
    #[serde(default = "default_good_down")]
    pub good_down: String,
}

/// Sound cue files, relative to the config file directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SoundConfig {
    #[serde(default = "default_good_sound")]
    pub good: PathBuf,
    #[serde(default = "default_bad_sound")]
    pub bad: PathBuf,
    #[serde(default = "default_overlap_sound")]
    pub overlap: PathBuf,
}

/// Cue volumes and their bounds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VolumeConfig {
    #[serde(default = "default_master_volume")]
    pub master: f32,
    #[serde(default = "default_good_volume")]
    pub good: f32,
    #[serde(default = "default_bad_volume")]
    pub bad: f32,
    #[serde(default = "default_overlap_volume")]
    pub overlap: f32,
    #[serde(default = "default_min_volume")]
    pub min: f32,
    #[serde(default = "default_max_volume")]
    pub max: f32,
    #[serde(default = "default_volume_step")]
    pub step: f32,
}

/// Console overlay configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverlayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_overlay_scale")]
    pub scale: u8,
}

/// HUD server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

/// Reversal detection window
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_lookback")]
    pub reversal_lookback_ms: u64,
    #[serde(default = "default_post_release")]
    pub reversal_post_release_ms: u64,
}

impl EngineConfig {
    pub fn reversal_window(&self) -> ReversalWindow {
        ReversalWindow::new(self.reversal_lookback_ms, self.reversal_post_release_ms)
    }
}

impl SoundConfig {
    /// Absolute cue paths, resolving relative entries against `base`
    pub fn resolve(&self, base: &Path) -> SoundConfig {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        SoundConfig {
            good: join(&self.good),
            bad: join(&self.bad),
            overlap: join(&self.overlap),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, writing the defaults first if the file is missing
    pub async fn load_or_create(path: &str) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            info!("Config file not found, writing defaults to {}", path);
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
                }
            }
            AppConfig::default().save(path).await?;
        }
        Self::load(path).await
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let moves = [
            ("forward", &self.bindings.forward),
            ("back", &self.bindings.back),
            ("left", &self.bindings.left),
            ("right", &self.bindings.right),
        ];
        let mut seen = HashSet::new();
        for (name, key) in moves {
            if key.trim().is_empty() {
                anyhow::bail!("Movement binding '{}' cannot be empty", name);
            }
            if !seen.insert(key.trim().to_lowercase()) {
                anyhow::bail!("Key '{}' is bound to more than one movement direction", key);
            }
        }

        let v = &self.volume;
        if !(v.min.is_finite() && v.max.is_finite()) || v.min < 0.0 || v.min > v.max {
            anyhow::bail!(
                "Volume bounds are invalid (min {} must be >= 0 and <= max {})",
                v.min,
                v.max
            );
        }
        if v.step.is_nan() || v.step <= 0.0 {
            anyhow::bail!("Volume step must be positive (got {})", v.step);
        }

        if !(1..=4).contains(&self.overlay.scale) {
            anyhow::bail!("Overlay scale {} is invalid (must be 1-4)", self.overlay.scale);
        }

        let e = &self.engine;
        if e.reversal_lookback_ms > MAX_REVERSAL_WINDOW_MS
            || e.reversal_post_release_ms > MAX_REVERSAL_WINDOW_MS
        {
            anyhow::bail!(
                "Reversal window sides must be at most {} ms (lookback {}, post-release {})",
                MAX_REVERSAL_WINDOW_MS,
                e.reversal_lookback_ms,
                e.reversal_post_release_ms
            );
        }
        if e.reversal_post_release_ms > e.reversal_lookback_ms {
            anyhow::bail!(
                "reversal_post_release_ms ({}) cannot exceed reversal_lookback_ms ({})",
                e.reversal_post_release_ms,
                e.reversal_lookback_ms
            );
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        if self.server.broadcast_capacity == 0 {
            anyhow::bail!("Server broadcast_capacity must be at least 1");
        }

        Ok(())
    }
}

impl Default for MovementBindings {
    fn default() -> Self {
        Self {
            forward: default_forward(),
            back: default_back(),
            left: default_left(),
            right: default_right(),
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle_overlay: default_toggle_overlay(),
            terminate: default_terminate(),
            increase_size: default_increase_size(),
            decrease_size: default_decrease_size(),
        }
    }
}

impl Default for VolumeKeyConfig {
    fn default() -> Self {
        Self {
            master_up: default_master_up(),
            master_down: default_master_down(),
            bad_up: default_bad_up(),
            bad_down: default_bad_down(),
            overlap_up: default_overlap_up(),
            overlap_down: default_overlap_down(),
            good_up: default_good_up(),
            good_down: default_good_down(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            good: default_good_sound(),
            bad: default_bad_sound(),
            overlap: default_overlap_sound(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            master: default_master_volume(),
            good: default_good_volume(),
            bad: default_bad_volume(),
            overlap: default_overlap_volume(),
            min: default_min_volume(),
            max: default_max_volume(),
            step: default_volume_step(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            scale: default_overlay_scale(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reversal_lookback_ms: default_lookback(),
            reversal_post_release_ms: default_post_release(),
        }
    }
}

// Default value functions
fn default_forward() -> String { "W".to_string() }
fn default_back() -> String { "S".to_string() }
fn default_left() -> String { "A".to_string() }
fn default_right() -> String { "D".to_string() }
fn default_toggle_overlay() -> String { "F6".to_string() }
fn default_terminate() -> String { "F8".to_string() }
fn default_increase_size() -> String { "=".to_string() }
fn default_decrease_size() -> String { "-".to_string() }
fn default_master_up() -> String { "kp+".to_string() }
fn default_master_down() -> String { "kp-".to_string() }
fn default_bad_up() -> String { "kp1".to_string() }
fn default_bad_down() -> String { "kp2".to_string() }
fn default_overlap_up() -> String { "kp4".to_string() }
fn default_overlap_down() -> String { "kp5".to_string() }
fn default_good_up() -> String { "kp7".to_string() }
fn default_good_down() -> String { "kp8".to_string() }
fn default_good_sound() -> PathBuf { PathBuf::from("sounds/good.wav") }
fn default_bad_sound() -> PathBuf { PathBuf::from("sounds/bad.wav") }
fn default_overlap_sound() -> PathBuf { PathBuf::from("sounds/overlap.wav") }
fn default_master_volume() -> f32 { 1.0 }
fn default_good_volume() -> f32 { 0.3 }
fn default_bad_volume() -> f32 { 0.3 }
fn default_overlap_volume() -> f32 { 0.6 }
fn default_min_volume() -> f32 { 0.0 }
fn default_max_volume() -> f32 { 2.5 }
fn default_volume_step() -> f32 { 0.1 }
fn default_true() -> bool { true }
fn default_overlay_scale() -> u8 { 2 }
fn default_server_host() -> String { "0.0.0.0".to_string() }
fn default_server_port() -> u16 { 8000 }
fn default_broadcast_capacity() -> usize { 64 }
fn default_lookback() -> u64 { DEFAULT_REVERSAL_LOOKBACK_MS }
fn default_post_release() -> u64 { DEFAULT_REVERSAL_POST_RELEASE_MS }
