//! Refinement of raw classifications into graded verdicts
//!
//! The thresholds encode the "crisp stop, quick fire" window and are not
//! configurable.

use super::types::{FinalClassification, Label, Millis, RawClassification};

/// Any shot later than this after the release is graded Bad
pub const MAX_SHOT_DELAY_MS: Millis = 230;

/// A slow reversal combined with a slow shot is graded Bad
pub const SLOW_REVERSAL_MS: Millis = 215;
pub const SLOW_SHOT_DELAY_MS: Millis = 215;

/// Grade a raw classification; labels can only be downgraded
pub fn refine(raw: &RawClassification) -> FinalClassification {
    match raw.label {
        Label::Overlap => *raw,
        Label::CounterStrafe => match (raw.cs_time, raw.shot_delay) {
            (Some(cs_time), Some(shot_delay)) => {
                let too_late = shot_delay > MAX_SHOT_DELAY_MS;
                let sluggish = cs_time > SLOW_REVERSAL_MS && shot_delay > SLOW_SHOT_DELAY_MS;
                if too_late || sluggish {
                    FinalClassification::graded_bad(cs_time, shot_delay)
                } else {
                    FinalClassification::counter_strafe(Some(cs_time), Some(shot_delay))
                }
            }
            _ => FinalClassification::bad(),
        },
        Label::Bad => FinalClassification::bad(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cs(cs_time: Millis, shot_delay: Millis) -> RawClassification {
        RawClassification::counter_strafe(Some(cs_time), Some(shot_delay))
    }

    #[test]
    fn test_overlap_passes_through() {
        let raw = RawClassification::overlap(42);
        assert_eq!(refine(&raw), raw);
    }

    #[test]
    fn test_threshold_boundaries() {
        // Exactly at the limits is still a counter-strafe
        assert_eq!(refine(&cs(215, 230)), cs(215, 230));
        assert_eq!(refine(&cs(500, 215)), cs(500, 215));

        assert_eq!(refine(&cs(10, 231)), FinalClassification::graded_bad(10, 231));
        assert_eq!(refine(&cs(216, 216)), FinalClassification::graded_bad(216, 216));
    }

    #[test]
    fn test_slow_reversal_and_slow_shot_is_bad() {
        assert_eq!(refine(&cs(250, 220)), FinalClassification::graded_bad(250, 220));
    }

    #[test]
    fn test_missing_fields_drop_to_bare_bad() {
        let no_cs = RawClassification::counter_strafe(None, Some(50));
        let no_delay = RawClassification::counter_strafe(Some(50), None);
        assert_eq!(refine(&no_cs), FinalClassification::bad());
        assert_eq!(refine(&no_delay), FinalClassification::bad());
    }

    #[test]
    fn test_bad_drops_fields() {
        let raw = RawClassification::graded_bad(10, 10);
        assert_eq!(refine(&raw), FinalClassification::bad());
    }

    proptest! {
        #[test]
        fn prop_within_window_is_preserved(cs_time in 0u64..1000, shot_delay in 0u64..=230) {
            prop_assume!(!(cs_time > 215 && shot_delay > 215));
            let raw = cs(cs_time, shot_delay);
            prop_assert_eq!(refine(&raw), raw);
        }

        #[test]
        fn prop_late_shot_is_bad_with_fields(cs_time in 0u64..1000, shot_delay in 231u64..5000) {
            prop_assert_eq!(
                refine(&cs(cs_time, shot_delay)),
                FinalClassification::graded_bad(cs_time, shot_delay)
            );
        }

        #[test]
        fn prop_slow_pair_is_bad_with_fields(cs_time in 216u64..1000, shot_delay in 216u64..=230) {
            prop_assert_eq!(
                refine(&cs(cs_time, shot_delay)),
                FinalClassification::graded_bad(cs_time, shot_delay)
            );
        }

        #[test]
        fn prop_never_upgrades(cs_time in proptest::option::of(0u64..1000),
                               shot_delay in proptest::option::of(0u64..1000)) {
            let raw = RawClassification::counter_strafe(cs_time, shot_delay);
            let refined = refine(&raw);
            prop_assert!(refined.label != Label::Overlap);
            prop_assert_eq!(refined.cs_time.is_some(), refined.shot_delay.is_some());
            prop_assert_eq!(refine(&RawClassification::bad()), FinalClassification::bad());
        }
    }
}
