//! Shot classification engine
//!
//! The [`Engine`] owns the key timeline behind a single exclusive lock.
//! Press and release events mutate it; a shot takes a consistent read under
//! the same lock, and grading happens after the lock is released so no
//! downstream work ever runs while capture threads are waiting.

pub mod classifier;
pub mod policy;
pub mod timeline;
pub mod types;

#[cfg(test)]
mod tests;

use parking_lot::Mutex;
use tracing::debug;

pub use timeline::{KeyTimeline, ReversalWindow};
pub use types::{
    Classification, FinalClassification, KeyState, Label, Millis, MovementKey,
    RawClassification, ShotEvent, Timestamp,
};

/// Thread-safe counter-strafe timing oracle
///
/// Share it as `Arc<Engine>` between capture threads. Every operation is
/// synchronous and bounded; none of them read a clock.
pub struct Engine {
    timeline: Mutex<KeyTimeline>,
}

impl Engine {
    /// Create an engine with an empty timeline
    pub fn new(window: ReversalWindow) -> Self {
        Self {
            timeline: Mutex::new(KeyTimeline::new(window)),
        }
    }

    /// A movement key went down
    pub fn on_press(&self, key: MovementKey, ts: Timestamp) {
        self.timeline.lock().on_press(key, ts);
    }

    /// A movement key went up
    pub fn on_release(&self, key: MovementKey, ts: Timestamp) {
        self.timeline.lock().on_release(key, ts);
    }

    /// Raw classification of a shot at `ts`, without grading
    ///
    /// Repeated calls with the same `ts` on an unchanged timeline return the
    /// same value.
    pub fn classify_shot(&self, ts: Timestamp) -> RawClassification {
        let timeline = self.timeline.lock();
        classifier::classify(&timeline, ShotEvent { timestamp: ts })
    }

    /// Classify and grade a shot fired at `ts`
    pub fn on_shot(&self, ts: Timestamp) -> FinalClassification {
        let raw = self.classify_shot(ts);
        let graded = policy::refine(&raw);
        debug!(
            "Shot at {}: raw={} final={} (cs={:?}, delay={:?}, overlap={:?})",
            ts, raw.label, graded.label, graded.cs_time, graded.shot_delay, graded.overlap_time
        );
        graded
    }

    /// Copy of the current timeline
    pub fn snapshot(&self) -> KeyTimeline {
        self.timeline.lock().clone()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ReversalWindow::default())
    }
}
