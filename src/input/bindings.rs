//! Physical key to action resolution
//!
//! Physical key names come from the capture layer ("a", "F6", "kp+", "=").
//! They are normalized to lowercase and looked up in a table built from the
//! config. The engine only ever sees the four canonical [`MovementKey`]s.

use std::collections::HashMap;
use thiserror::Error;

use crate::config::AppConfig;
use crate::engine::MovementKey;
use crate::feedback::sound::Cue;

/// Volume hotkey action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeCommand {
    MasterUp,
    MasterDown,
    CueUp(Cue),
    CueDown(Cue),
}

/// What a physical key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    Move(MovementKey),
    Volume(VolumeCommand),
    ToggleOverlay,
    Terminate,
    IncreaseSize,
    DecreaseSize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("binding for {action} is empty")]
    Empty { action: String },
    #[error("key '{key}' is bound to both {first} and {second}")]
    Conflict {
        key: String,
        first: String,
        second: String,
    },
}

/// Lookup table from normalized physical key names to actions
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    table: HashMap<String, (BoundAction, &'static str)>,
}

/// Normalize a physical key name for lookup
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl KeyBindings {
    /// Build the table from the config sections
    pub fn from_config(config: &AppConfig) -> Result<Self, BindingError> {
        let b = &config.bindings;
        let h = &config.hotkeys;
        let v = &config.volume_keys;

        let entries: [(&String, BoundAction, &'static str); 16] = [
            (&b.forward, BoundAction::Move(MovementKey::Forward), "move forward"),
            (&b.back, BoundAction::Move(MovementKey::Back), "move back"),
            (&b.left, BoundAction::Move(MovementKey::Left), "move left"),
            (&b.right, BoundAction::Move(MovementKey::Right), "move right"),
            (&h.toggle_overlay, BoundAction::ToggleOverlay, "toggle overlay"),
            (&h.terminate, BoundAction::Terminate, "terminate"),
            (&h.increase_size, BoundAction::IncreaseSize, "increase size"),
            (&h.decrease_size, BoundAction::DecreaseSize, "decrease size"),
            (&v.master_up, BoundAction::Volume(VolumeCommand::MasterUp), "master volume up"),
            (&v.master_down, BoundAction::Volume(VolumeCommand::MasterDown), "master volume down"),
            (&v.bad_up, BoundAction::Volume(VolumeCommand::CueUp(Cue::Bad)), "bad volume up"),
            (&v.bad_down, BoundAction::Volume(VolumeCommand::CueDown(Cue::Bad)), "bad volume down"),
            (&v.overlap_up, BoundAction::Volume(VolumeCommand::CueUp(Cue::Overlap)), "overlap volume up"),
            (&v.overlap_down, BoundAction::Volume(VolumeCommand::CueDown(Cue::Overlap)), "overlap volume down"),
            (&v.good_up, BoundAction::Volume(VolumeCommand::CueUp(Cue::Good)), "good volume up"),
            (&v.good_down, BoundAction::Volume(VolumeCommand::CueDown(Cue::Good)), "good volume down"),
        ];

        let mut table: HashMap<String, (BoundAction, &'static str)> =
            HashMap::with_capacity(entries.len());
        for (key, action, label) in entries {
            let normalized = normalize_key(key);
            if normalized.is_empty() {
                return Err(BindingError::Empty {
                    action: label.to_string(),
                });
            }
            if let Some((_, first)) = table.get(&normalized) {
                return Err(BindingError::Conflict {
                    key: key.clone(),
                    first: (*first).to_string(),
                    second: label.to_string(),
                });
            }
            table.insert(normalized, (action, label));
        }

        Ok(Self { table })
    }

    /// Action bound to a physical key, if any
    pub fn resolve(&self, physical: &str) -> Option<BoundAction> {
        self.table.get(&normalize_key(physical)).map(|(action, _)| *action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_movement_keys() {
        let bindings = KeyBindings::from_config(&AppConfig::default()).unwrap();
        assert_eq!(bindings.resolve("w"), Some(BoundAction::Move(MovementKey::Forward)));
        assert_eq!(bindings.resolve("S"), Some(BoundAction::Move(MovementKey::Back)));
        assert_eq!(bindings.resolve("a"), Some(BoundAction::Move(MovementKey::Left)));
        assert_eq!(bindings.resolve(" D "), Some(BoundAction::Move(MovementKey::Right)));
        assert_eq!(bindings.resolve("q"), None);
    }

    #[test]
    fn test_default_hotkeys() {
        let bindings = KeyBindings::from_config(&AppConfig::default()).unwrap();
        assert_eq!(bindings.resolve("F6"), Some(BoundAction::ToggleOverlay));
        assert_eq!(bindings.resolve("f8"), Some(BoundAction::Terminate));
        assert_eq!(bindings.resolve("="), Some(BoundAction::IncreaseSize));
        assert_eq!(bindings.resolve("-"), Some(BoundAction::DecreaseSize));
        assert_eq!(
            bindings.resolve("KP+"),
            Some(BoundAction::Volume(VolumeCommand::MasterUp))
        );
        assert_eq!(
            bindings.resolve("kp7"),
            Some(BoundAction::Volume(VolumeCommand::CueUp(Cue::Good)))
        );
        assert_eq!(
            bindings.resolve("kp5"),
            Some(BoundAction::Volume(VolumeCommand::CueDown(Cue::Overlap)))
        );
    }

    #[test]
    fn test_conflicting_binding_is_rejected() {
        let mut config = AppConfig::default();
        config.hotkeys.toggle_overlay = "a".to_string();
        let err = KeyBindings::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            BindingError::Conflict {
                key: "a".to_string(),
                first: "move left".to_string(),
                second: "toggle overlay".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_binding_is_rejected() {
        let mut config = AppConfig::default();
        config.volume_keys.good_down = "  ".to_string();
        assert!(matches!(
            KeyBindings::from_config(&config),
            Err(BindingError::Empty { .. })
        ));
    }

    #[test]
    fn test_custom_layout() {
        let mut config = AppConfig::default();
        config.bindings.forward = "I".to_string();
        config.bindings.left = "J".to_string();
        let bindings = KeyBindings::from_config(&config).unwrap();
        assert_eq!(bindings.resolve("j"), Some(BoundAction::Move(MovementKey::Left)));
        assert_eq!(bindings.resolve("a"), None);
    }
}
