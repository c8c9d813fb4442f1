//! Engine value types: movement keys, key state, and classifications

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds from the single process clock
pub type Timestamp = u64;

/// Elapsed milliseconds between two timestamps
pub type Millis = u64;

/// Canonical movement direction seen by the engine
///
/// Physical keys are resolved to one of these by the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKey {
    Forward,
    Back,
    Left,
    Right,
}

impl MovementKey {
    /// All keys in timeline order
    pub const ALL: [MovementKey; 4] = [
        MovementKey::Forward,
        MovementKey::Back,
        MovementKey::Left,
        MovementKey::Right,
    ];

    /// The key that moves in the opposite direction
    pub fn opposite(self) -> MovementKey {
        match self {
            MovementKey::Forward => MovementKey::Back,
            MovementKey::Back => MovementKey::Forward,
            MovementKey::Left => MovementKey::Right,
            MovementKey::Right => MovementKey::Left,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            MovementKey::Forward => 0,
            MovementKey::Back => 1,
            MovementKey::Left => 2,
            MovementKey::Right => 3,
        }
    }
}

impl fmt::Display for MovementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MovementKey::Forward => "forward",
            MovementKey::Back => "back",
            MovementKey::Left => "left",
            MovementKey::Right => "right",
        };
        f.write_str(name)
    }
}

/// Opposite-direction key pairs, checked in this order for overlap
pub const OPPOSITE_PAIRS: [(MovementKey, MovementKey); 2] = [
    (MovementKey::Left, MovementKey::Right),
    (MovementKey::Forward, MovementKey::Back),
];

/// Press/release history of one movement key
///
/// `held == true` implies `last_press_ts` is set and not older than
/// `last_release_ts`, as long as callers hand in monotonic timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyState {
    pub held: bool,
    pub last_press_ts: Option<Timestamp>,
    pub last_release_ts: Option<Timestamp>,
}

impl KeyState {
    /// Whether the key was down at `ts`
    pub fn held_at(&self, ts: Timestamp) -> bool {
        self.held && self.last_press_ts.is_some_and(|p| p <= ts)
    }
}

/// Shot verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Overlap,
    CounterStrafe,
    Bad,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Overlap => "Overlap",
            Label::CounterStrafe => "CounterStrafe",
            Label::Bad => "Bad",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification shape shared by the raw and final stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub overlap_time: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cs_time: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shot_delay: Option<Millis>,
}

impl Classification {
    pub fn overlap(overlap_time: Millis) -> Self {
        Self {
            label: Label::Overlap,
            overlap_time: Some(overlap_time),
            cs_time: None,
            shot_delay: None,
        }
    }

    pub fn counter_strafe(cs_time: Option<Millis>, shot_delay: Option<Millis>) -> Self {
        Self {
            label: Label::CounterStrafe,
            overlap_time: None,
            cs_time,
            shot_delay,
        }
    }

    /// Bad with no timing fields
    pub fn bad() -> Self {
        Self {
            label: Label::Bad,
            overlap_time: None,
            cs_time: None,
            shot_delay: None,
        }
    }

    /// Bad that keeps the timings which explain the verdict
    pub fn graded_bad(cs_time: Millis, shot_delay: Millis) -> Self {
        Self {
            label: Label::Bad,
            overlap_time: None,
            cs_time: Some(cs_time),
            shot_delay: Some(shot_delay),
        }
    }
}

/// Unrefined signal derived from the key timeline
pub type RawClassification = Classification;

/// Graded verdict after policy refinement
pub type FinalClassification = Classification;

/// A fire event, alive for one classification call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotEvent {
    pub timestamp: Timestamp,
}
