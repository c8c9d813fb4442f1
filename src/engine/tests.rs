//! Scenario tests for the engine front

use super::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

use MovementKey::*;

/// Left held 0..500 with the reversal (Right) pressed at 400 and still held
fn strafe_left_then_reverse() -> Engine {
    let engine = Engine::default();
    engine.on_press(Left, 0);
    engine.on_press(Right, 400);
    engine.on_release(Left, 500);
    engine
}

#[test]
fn test_scenario_a_clean_counter_strafe() {
    let engine = strafe_left_then_reverse();
    assert_eq!(
        engine.on_shot(650),
        FinalClassification::counter_strafe(Some(100), Some(150))
    );
}

#[test]
fn test_scenario_b_late_shot_is_bad_with_timings() {
    let engine = strafe_left_then_reverse();
    assert_eq!(engine.on_shot(900), FinalClassification::graded_bad(100, 400));
}

#[test]
fn test_scenario_c_overlap() {
    let engine = Engine::default();
    engine.on_press(Left, 0);
    engine.on_press(Right, 300);
    assert_eq!(engine.on_shot(350), FinalClassification::overlap(50));
}

#[test]
fn test_scenario_d_no_release_ever() {
    let engine = Engine::default();
    assert_eq!(engine.on_shot(100), FinalClassification::bad());
}

#[test]
fn test_scenario_e_missing_reversal_loses_fields() {
    let engine = Engine::default();
    engine.on_release(Left, 0);

    let raw = engine.classify_shot(50);
    assert_eq!(raw, RawClassification::counter_strafe(None, Some(50)));
    assert_eq!(engine.on_shot(50), FinalClassification::bad());
}

#[test]
fn test_scenario_f_slow_reversal_and_slow_shot() {
    let engine = Engine::default();
    engine.on_press(Left, 0);
    engine.on_press(Right, 250);
    engine.on_release(Left, 500);

    let raw = engine.classify_shot(720);
    assert_eq!(raw, RawClassification::counter_strafe(Some(250), Some(220)));
    assert_eq!(engine.on_shot(720), FinalClassification::graded_bad(250, 220));
}

#[test]
fn test_classify_shot_is_idempotent() {
    let engine = strafe_left_then_reverse();
    let first = engine.classify_shot(650);
    for _ in 0..10 {
        assert_eq!(engine.classify_shot(650), first);
        assert_eq!(engine.on_shot(650), engine.on_shot(650));
    }
    assert_eq!(engine.snapshot(), strafe_left_then_reverse().snapshot());
}

#[test]
fn test_overlap_ignores_earlier_counter_strafe() {
    let engine = strafe_left_then_reverse();
    engine.on_press(Left, 600);
    assert_eq!(engine.on_shot(640), FinalClassification::overlap(40));
}

#[test]
fn test_vertical_counter_strafe() {
    let engine = Engine::default();
    engine.on_press(Forward, 0);
    engine.on_press(Back, 320);
    engine.on_release(Forward, 400);
    engine.on_release(Back, 410);

    // Back is the tap: the gap is measured from Forward's release
    assert_eq!(
        engine.on_shot(480),
        FinalClassification::counter_strafe(Some(80), Some(70))
    );
}

#[test]
fn test_tap_counter_strafe_grades_clean() {
    let engine = Engine::default();
    engine.on_press(Left, 0);
    engine.on_release(Left, 500);
    engine.on_press(Right, 520);
    engine.on_release(Right, 600);

    assert_eq!(
        engine.on_shot(650),
        FinalClassification::counter_strafe(Some(20), Some(50))
    );
}

#[test]
fn test_slow_gap_after_release_is_graded() {
    let engine = Engine::default();
    engine.on_press(Left, 0);
    engine.on_release(Left, 500);
    engine.on_press(Right, 650);

    assert_eq!(
        engine.on_shot(700),
        FinalClassification::counter_strafe(Some(150), Some(200))
    );
}

#[test]
fn test_concurrent_capture_threads_serialize() {
    let engine = Arc::new(Engine::default());

    let keyboard = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..1000u64 {
                let ts = i * 10;
                engine.on_press(Left, ts);
                engine.on_release(Left, ts + 5);
            }
        })
    };
    let mouse = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..1000u64 {
                let verdict = engine.on_shot(i * 10 + 7);
                assert_ne!(verdict.label, Label::Overlap);
            }
        })
    };

    keyboard.join().unwrap();
    mouse.join().unwrap();

    let snapshot = engine.snapshot();
    let left = snapshot.state(Left);
    assert!(!left.held);
    assert_eq!(left.last_press_ts, Some(9990));
    assert_eq!(left.last_release_ts, Some(9995));
}

proptest! {
    #[test]
    fn prop_opposite_pair_held_is_overlap(
        first in 0u64..10_000,
        gap in 0u64..5_000,
        wait in 0u64..5_000,
        vertical in any::<bool>(),
        history in proptest::collection::vec((0usize..4, 0u64..10_000), 0..8),
    ) {
        let engine = Engine::default();
        for (idx, ts) in history {
            let key = MovementKey::ALL[idx];
            engine.on_press(key, ts.min(first));
            engine.on_release(key, ts.min(first));
        }

        let (a, b) = if vertical { (Forward, Back) } else { (Left, Right) };
        engine.on_press(a, first);
        engine.on_press(b, first + gap);
        let t = first + gap + wait;

        // Horizontal pair wins when both pairs are held; only the pair we
        // pressed is held here.
        prop_assert_eq!(engine.on_shot(t), FinalClassification::overlap(wait));
    }

    #[test]
    fn prop_final_fields_are_paired(
        events in proptest::collection::vec((0usize..4, any::<bool>(), 0u64..2_000), 0..20),
        shot in 0u64..3_000,
    ) {
        let engine = Engine::default();
        let mut ordered = events;
        ordered.sort_by_key(|e| e.2);
        for (idx, down, ts) in ordered {
            let key = MovementKey::ALL[idx];
            if down { engine.on_press(key, ts) } else { engine.on_release(key, ts) }
        }

        let verdict = engine.on_shot(shot);
        prop_assert_eq!(verdict.cs_time.is_some(), verdict.shot_delay.is_some());
        prop_assert_eq!(verdict.overlap_time.is_some(), verdict.label == Label::Overlap);
        if verdict.label == Label::CounterStrafe {
            prop_assert!(verdict.shot_delay.unwrap() <= policy::MAX_SHOT_DELAY_MS);
        }
    }
}
