//! Per-key press/release timeline
//!
//! Holds exactly one [`KeyState`] per [`MovementKey`] for the lifetime of an
//! engine. Malformed sequences (repeats, orphan releases) are absorbed as
//! best-effort updates so a shot can always be classified.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::types::{KeyState, Millis, MovementKey, Timestamp, OPPOSITE_PAIRS};

/// Default lookback before a release in which a reversal press counts
pub const DEFAULT_REVERSAL_LOOKBACK_MS: Millis = 500;

/// Default grace after a release in which a reversal press still counts
///
/// Wider than the slowest gradable gap so a slow reversal is still reported
/// with its timing instead of losing it.
pub const DEFAULT_REVERSAL_POST_RELEASE_MS: Millis = 500;

/// Tolerance window around a release used to find a direction reversal
///
/// Both bounds are inclusive: a reversal press at `release - lookback_ms`
/// or at `release + post_release_ms` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalWindow {
    pub lookback_ms: Millis,
    pub post_release_ms: Millis,
}

impl ReversalWindow {
    pub fn new(lookback_ms: Millis, post_release_ms: Millis) -> Self {
        Self {
            lookback_ms,
            post_release_ms,
        }
    }

    /// Whether `press_ts` falls inside the window around `release_ts`
    pub fn contains(&self, release_ts: Timestamp, press_ts: Timestamp) -> bool {
        let start = release_ts.saturating_sub(self.lookback_ms);
        let end = release_ts.saturating_add(self.post_release_ms);
        (start..=end).contains(&press_ts)
    }
}

impl Default for ReversalWindow {
    fn default() -> Self {
        Self::new(DEFAULT_REVERSAL_LOOKBACK_MS, DEFAULT_REVERSAL_POST_RELEASE_MS)
    }
}

/// Both keys of an opposite pair held at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePair {
    pub pair: (MovementKey, MovementKey),
    /// The later of the two press timestamps
    pub later_press_ts: Timestamp,
}

/// A release that can anchor a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub key: MovementKey,
    pub release_ts: Timestamp,
}

/// Press/release state for the four movement keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyTimeline {
    keys: [KeyState; 4],
    window: ReversalWindow,
}

impl KeyTimeline {
    pub fn new(window: ReversalWindow) -> Self {
        Self {
            keys: [KeyState::default(); 4],
            window,
        }
    }

    pub fn state(&self, key: MovementKey) -> &KeyState {
        &self.keys[key.index()]
    }

    /// Record a key press; a repeat while held only refreshes the timestamp
    pub fn on_press(&mut self, key: MovementKey, ts: Timestamp) {
        let state = &mut self.keys[key.index()];
        if state.held {
            trace!("Key repeat: {} at {}", key, ts);
        }
        state.held = true;
        state.last_press_ts = Some(ts);
    }

    /// Record a key release
    ///
    /// An orphan release (no press ever recorded) still stores its timestamp.
    pub fn on_release(&mut self, key: MovementKey, ts: Timestamp) {
        let state = &mut self.keys[key.index()];
        if state.last_press_ts.is_none() {
            trace!("Orphan release: {} at {}", key, ts);
        }
        state.held = false;
        state.last_release_ts = Some(ts);
    }

    /// First opposite pair with both keys held at `ts`
    pub fn opposite_pair_active(&self, ts: Timestamp) -> Option<ActivePair> {
        OPPOSITE_PAIRS.iter().find_map(|&(a, b)| {
            let (sa, sb) = (self.state(a), self.state(b));
            if !(sa.held_at(ts) && sb.held_at(ts)) {
                return None;
            }
            let later_press_ts = sa.last_press_ts.max(sb.last_press_ts)?;
            Some(ActivePair {
                pair: (a, b),
                later_press_ts,
            })
        })
    }

    /// Latest release strictly before `ts` that no later press has superseded
    pub fn most_recent_release_before(&self, ts: Timestamp) -> Option<Release> {
        MovementKey::ALL
            .iter()
            .filter_map(|&key| {
                let state = self.state(key);
                let release_ts = state.last_release_ts.filter(|&r| r < ts)?;
                let superseded = state
                    .last_press_ts
                    .is_some_and(|p| p > release_ts && p <= ts);
                (!superseded).then_some(Release { key, release_ts })
            })
            .max_by_key(|r| r.release_ts)
    }

    /// Press time of the reversal key opposite `release_key`, if any
    ///
    /// The opposite key must have been pressed at or after the releasing
    /// key's own last press and within the reversal window.
    pub fn reversal_onset_for(
        &self,
        release_key: MovementKey,
        release_ts: Timestamp,
    ) -> Option<Timestamp> {
        let own_press = self.state(release_key).last_press_ts?;
        let reversal_press = self.state(release_key.opposite()).last_press_ts?;

        if reversal_press < own_press {
            return None;
        }
        self.window
            .contains(release_ts, reversal_press)
            .then_some(reversal_press)
    }

    /// Reversal where `tap_key` is itself the counter-strafe tap
    ///
    /// The opposite key was released before the tap was, was not pressed
    /// again, and the tap press lies inside the window around that release.
    /// Returns the opposite key's release time and the tap's press time.
    pub fn tap_reversal_for(
        &self,
        tap_key: MovementKey,
        tap_release_ts: Timestamp,
    ) -> Option<(Timestamp, Timestamp)> {
        let stopped = tap_key.opposite();
        let state = self.state(stopped);
        let stop_release = state.last_release_ts.filter(|&r| r < tap_release_ts)?;
        if state.last_press_ts.is_some_and(|p| p > stop_release) {
            return None;
        }

        let tap_press = self.reversal_onset_for(stopped, stop_release)?;
        Some((stop_release, tap_press))
    }
}
