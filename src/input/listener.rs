//! Input listener - routes capture events to the engine and hotkeys
//!
//! Runs on the capture thread. Movement keys and shots go through the
//! engine synchronously; the graded shot is handed to the dispatcher only
//! after the engine call returns, so sinks never run under the engine lock.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info};

use super::bindings::{BoundAction, KeyBindings, VolumeCommand};
use super::{InputEvent, MouseButton};
use crate::engine::{Engine, FinalClassification, MovementKey};
use crate::feedback::{FeedbackDispatcher, OverlayState, ShotReport, VolumeMixer};

/// What the listener did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Pressed(MovementKey),
    Released(MovementKey),
    Shot(FinalClassification),
    Hotkey(BoundAction),
    Terminate,
    Ignored,
}

/// Capture-side dispatcher shared by all input sources
#[derive(Clone)]
pub struct InputListener {
    engine: Arc<Engine>,
    bindings: Arc<RwLock<KeyBindings>>,
    mixer: Arc<Mutex<VolumeMixer>>,
    overlay: Arc<OverlayState>,
    dispatcher: FeedbackDispatcher,
    shutdown: Arc<Notify>,
}

impl InputListener {
    pub fn new(
        engine: Arc<Engine>,
        bindings: KeyBindings,
        mixer: Arc<Mutex<VolumeMixer>>,
        overlay: Arc<OverlayState>,
        dispatcher: FeedbackDispatcher,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            engine,
            bindings: Arc::new(RwLock::new(bindings)),
            mixer,
            overlay,
            dispatcher,
            shutdown,
        }
    }

    /// Swap in new bindings after a config reload
    pub fn set_bindings(&self, bindings: KeyBindings) {
        *self.bindings.write() = bindings;
        info!("Key bindings updated");
    }

    /// Handle one capture event
    pub fn handle(&self, event: &InputEvent) -> Handled {
        match event {
            InputEvent::KeyDown { key, ts } => match self.resolve(key) {
                Some(BoundAction::Move(movement)) => {
                    self.engine.on_press(movement, *ts);
                    Handled::Pressed(movement)
                }
                Some(action) => self.hotkey(action),
                None => Handled::Ignored,
            },
            InputEvent::KeyUp { key, ts } => match self.resolve(key) {
                Some(BoundAction::Move(movement)) => {
                    self.engine.on_release(movement, *ts);
                    Handled::Released(movement)
                }
                _ => Handled::Ignored,
            },
            InputEvent::Click {
                button: MouseButton::Left,
                pressed: true,
                ts,
            } => {
                let classification = self.engine.on_shot(*ts);
                self.dispatcher.submit(ShotReport {
                    timestamp: *ts,
                    classification,
                });
                Handled::Shot(classification)
            }
            InputEvent::Click { .. } => Handled::Ignored,
        }
    }

    fn resolve(&self, key: &str) -> Option<BoundAction> {
        let action = self.bindings.read().resolve(key);
        if action.is_none() {
            debug!("Unbound key: {}", key);
        }
        action
    }

    fn hotkey(&self, action: BoundAction) -> Handled {
        match action {
            BoundAction::ToggleOverlay => {
                self.overlay.toggle();
            }
            BoundAction::IncreaseSize => {
                self.overlay.increase();
            }
            BoundAction::DecreaseSize => {
                self.overlay.decrease();
            }
            BoundAction::Volume(command) => {
                let mut mixer = self.mixer.lock();
                match command {
                    VolumeCommand::MasterUp => mixer.master_up(),
                    VolumeCommand::MasterDown => mixer.master_down(),
                    VolumeCommand::CueUp(cue) => mixer.cue_up(cue),
                    VolumeCommand::CueDown(cue) => mixer.cue_down(cue),
                };
            }
            BoundAction::Terminate => {
                info!("Terminate hotkey pressed");
                self.shutdown.notify_one();
                return Handled::Terminate;
            }
            BoundAction::Move(_) => return Handled::Ignored,
        }
        Handled::Hotkey(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, VolumeConfig};
    use crate::feedback::Cue;
    use std::time::Duration;

    fn key_down(key: &str, ts: u64) -> InputEvent {
        InputEvent::KeyDown {
            key: key.to_string(),
            ts,
        }
    }

    fn key_up(key: &str, ts: u64) -> InputEvent {
        InputEvent::KeyUp {
            key: key.to_string(),
            ts,
        }
    }

    fn click(ts: u64) -> InputEvent {
        InputEvent::Click {
            button: MouseButton::Left,
            pressed: true,
            ts,
        }
    }

    fn listener() -> (InputListener, Arc<Notify>) {
        let (dispatcher, _task) = FeedbackDispatcher::spawn(16, Vec::new());
        let shutdown = Arc::new(Notify::new());
        let listener = InputListener::new(
            Arc::new(Engine::default()),
            KeyBindings::from_config(&AppConfig::default()).unwrap(),
            Arc::new(Mutex::new(VolumeMixer::from_config(&VolumeConfig::default()))),
            Arc::new(OverlayState::default()),
            dispatcher,
            shutdown.clone(),
        );
        (listener, shutdown)
    }

    #[tokio::test]
    async fn test_counter_strafe_through_bindings() {
        let (listener, _) = listener();
        assert_eq!(listener.handle(&key_down("a", 0)), Handled::Pressed(MovementKey::Left));
        assert_eq!(listener.handle(&key_down("D", 400)), Handled::Pressed(MovementKey::Right));
        assert_eq!(listener.handle(&key_up("a", 500)), Handled::Released(MovementKey::Left));
        assert_eq!(
            listener.handle(&click(650)),
            Handled::Shot(FinalClassification::counter_strafe(Some(100), Some(150)))
        );
    }

    #[tokio::test]
    async fn test_non_left_clicks_and_releases_are_ignored() {
        let (listener, _) = listener();
        let right_click = InputEvent::Click {
            button: MouseButton::Right,
            pressed: true,
            ts: 10,
        };
        let left_release = InputEvent::Click {
            button: MouseButton::Left,
            pressed: false,
            ts: 10,
        };
        assert_eq!(listener.handle(&right_click), Handled::Ignored);
        assert_eq!(listener.handle(&left_release), Handled::Ignored);
        assert_eq!(listener.handle(&key_down("q", 10)), Handled::Ignored);
        assert_eq!(listener.handle(&key_up("f6", 10)), Handled::Ignored);
    }

    #[tokio::test]
    async fn test_volume_hotkeys_adjust_mixer() {
        let (listener, _) = listener();
        let action = listener.handle(&key_down("kp7", 0));
        assert_eq!(
            action,
            Handled::Hotkey(BoundAction::Volume(VolumeCommand::CueUp(Cue::Good)))
        );
        assert!((listener.mixer.lock().cue(Cue::Good) - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_overlay_hotkeys() {
        let (listener, _) = listener();
        listener.handle(&key_down("f6", 0));
        assert!(!listener.overlay.is_visible());
        listener.handle(&key_down("=", 0));
        assert_eq!(listener.overlay.scale(), 3);
    }

    #[tokio::test]
    async fn test_terminate_notifies_shutdown() {
        let (listener, shutdown) = listener();
        assert_eq!(listener.handle(&key_down("F8", 0)), Handled::Terminate);
        tokio::time::timeout(Duration::from_millis(100), shutdown.notified())
            .await
            .expect("shutdown should be signalled");
    }

    #[tokio::test]
    async fn test_rebinding_takes_effect() {
        let (listener, _) = listener();
        let mut config = AppConfig::default();
        config.bindings.left = "J".to_string();
        listener.set_bindings(KeyBindings::from_config(&config).unwrap());

        assert_eq!(listener.handle(&key_down("a", 0)), Handled::Ignored);
        assert_eq!(listener.handle(&key_down("j", 0)), Handled::Pressed(MovementKey::Left));
    }
}
