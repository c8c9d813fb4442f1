//! Input capture boundary
//!
//! Capture sources (the interactive REPL, CSV replay) produce
//! [`InputEvent`]s stamped by a single [`Clock`]. The [`InputListener`]
//! resolves physical keys through the bindings and drives the engine.

pub mod bindings;
pub mod listener;
pub mod replay;

use std::time::Instant;

use crate::engine::Timestamp;

pub use bindings::{BoundAction, KeyBindings, VolumeCommand};
pub use listener::{Handled, InputListener};

/// Pointer button of a click event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Raw event from a capture source, keyed by physical key name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown { key: String, ts: Timestamp },
    KeyUp { key: String, ts: Timestamp },
    Click {
        button: MouseButton,
        pressed: bool,
        ts: Timestamp,
    },
}

impl InputEvent {
    pub fn ts(&self) -> Timestamp {
        match self {
            InputEvent::KeyDown { ts, .. }
            | InputEvent::KeyUp { ts, .. }
            | InputEvent::Click { ts, .. } => *ts,
        }
    }
}

/// Monotonic millisecond clock shared by all capture sources
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start_instant: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start_instant: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created
    pub fn now_ms(&self) -> Timestamp {
        self.start_instant.elapsed().as_millis() as Timestamp
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = Clock::new();
        let a = clock.now_ms();
        thread::sleep(Duration::from_millis(15));
        let b = clock.now_ms();
        assert!(b >= a + 10);
    }

    #[test]
    fn test_copies_share_origin() {
        let clock = Clock::new();
        let copy = clock;
        thread::sleep(Duration::from_millis(5));
        assert!(copy.now_ms().abs_diff(clock.now_ms()) <= 1);
    }
}
