//! Raw shot classification from the key timeline

use tracing::trace;

use super::timeline::KeyTimeline;
use super::types::{RawClassification, ShotEvent};

/// Derive the raw classification of a shot
///
/// Checks run in a fixed order: an opposite-pair overlap wins outright,
/// then the most recent qualifying release anchors `shot_delay`, and a
/// direction reversal around that release supplies `cs_time`. When that
/// release is itself the reversal tap, the gap is measured against the
/// release of the key it stopped. This is a pure read of the timeline.
pub fn classify(timeline: &KeyTimeline, shot: ShotEvent) -> RawClassification {
    let t = shot.timestamp;

    if let Some(active) = timeline.opposite_pair_active(t) {
        let overlap_time = t.saturating_sub(active.later_press_ts);
        trace!(
            "Overlap on {:?}: later press at {}, shot at {}",
            active.pair,
            active.later_press_ts,
            t
        );
        return RawClassification::overlap(overlap_time);
    }

    let Some(release) = timeline.most_recent_release_before(t) else {
        trace!("No qualifying release before shot at {}", t);
        return RawClassification::bad();
    };

    let shot_delay = t - release.release_ts;
    let cs_time = timeline
        .reversal_onset_for(release.key, release.release_ts)
        .map(|press_ts| press_ts.abs_diff(release.release_ts))
        .or_else(|| {
            // Release, tap the opposite key, fire: the latest release is the tap
            timeline
                .tap_reversal_for(release.key, release.release_ts)
                .map(|(stop_ts, tap_press)| tap_press.abs_diff(stop_ts))
        });

    trace!(
        "Release {} at {}: shot_delay={} cs_time={:?}",
        release.key,
        release.release_ts,
        shot_delay,
        cs_time
    );

    RawClassification::counter_strafe(cs_time, Some(shot_delay))
}
