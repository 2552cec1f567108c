//! # Property-Based Tests
//!
//! Verification of the engine's invariants under arbitrary inputs:
//! countdown arithmetic, clock offset application, and the monotonic,
//! ordered growth of the unlock set.

use keepsake_core::{
    AttemptOutcome, ClockOffset, CountdownSplit, GateConfig, MILLIS_PER_DAY, MILLIS_PER_HOUR,
    MILLIS_PER_MINUTE, MILLIS_PER_SECOND, MediaRef, ProgressionGate, Secret, StageConfig, StageId,
    SyncedClock,
};
use proptest::prelude::*;

// =============================================================================
// HELPERS
// =============================================================================

fn stage_sequence(count: usize) -> Vec<StageConfig> {
    (0..count)
        .map(|i| StageConfig {
            id: StageId::new(format!("stage-{i}")),
            secret: Secret::new(format!("secret-{i}")),
            media: MediaRef::new(format!("assets/audio/stage-{i}.mp3")),
        })
        .collect()
}

/// One externally driven gate event.
#[derive(Debug, Clone)]
enum GateEvent {
    Attempt { stage: usize, correct: bool },
    MediaCompleted { stage: usize },
    UnlockDue { stage: usize },
    Display { stage: usize },
}

fn gate_event(stage_count: usize) -> impl Strategy<Value = GateEvent> {
    let idx = 0..stage_count;
    prop_oneof![
        (idx.clone(), any::<bool>())
            .prop_map(|(stage, correct)| GateEvent::Attempt { stage, correct }),
        idx.clone().prop_map(|stage| GateEvent::MediaCompleted { stage }),
        idx.clone().prop_map(|stage| GateEvent::UnlockDue { stage }),
        idx.prop_map(|stage| GateEvent::Display { stage }),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The split components always reassemble to the floored remaining
    /// duration, and every component stays in its display range.
    #[test]
    fn countdown_split_reassembles(remaining in 0i64..(400 * MILLIS_PER_DAY)) {
        let split = CountdownSplit::from_remaining_ms(remaining);

        prop_assert!(split.hours < 24);
        prop_assert!(split.minutes < 60);
        prop_assert!(split.seconds < 60);
        prop_assert!(split.days >= 0);

        let reassembled = split.days * MILLIS_PER_DAY
            + split.hours * MILLIS_PER_HOUR
            + split.minutes * MILLIS_PER_MINUTE
            + split.seconds * MILLIS_PER_SECOND;
        prop_assert!(reassembled <= remaining);
        prop_assert!(remaining - reassembled < MILLIS_PER_SECOND);
    }

    /// Negative remaining durations always collapse to the zero split.
    #[test]
    fn countdown_split_clamps_negative(remaining in i64::MIN..=0) {
        prop_assert!(CountdownSplit::from_remaining_ms(remaining).is_zero());
    }

    /// The synced clock shifts every local sample by exactly the offset.
    #[test]
    fn synced_clock_is_a_pure_shift(
        offset in -86_400_000i64..86_400_000,
        local in 0i64..4_000_000_000_000,
    ) {
        let clock = SyncedClock::new(ClockOffset::new(offset));
        prop_assert_eq!(clock.now_ms(local) - local, offset);
    }

    /// A zero offset reproduces local time exactly (the fetch-failure
    /// fallback path).
    #[test]
    fn zero_offset_is_identity(local in any::<i64>()) {
        prop_assert_eq!(SyncedClock::new(ClockOffset::ZERO).now_ms(local), local);
    }

    /// Under arbitrary event sequences the unlock set only grows, never
    /// holds duplicates, and every unlocked stage (except the start) has
    /// an unlocked predecessor.
    #[test]
    fn gate_unlock_set_grows_monotonically_in_order(
        stage_count in 2usize..6,
        events in proptest::collection::vec(gate_event(6), 1..60),
    ) {
        let stages = stage_sequence(stage_count);
        let mut gate = ProgressionGate::new(GateConfig::new(stages.clone()))
            .expect("valid config");

        let mut previous_len = gate.unlocked().len();

        for event in events {
            match event {
                GateEvent::Attempt { stage, correct } => {
                    let stage = stage % stage_count;
                    let supplied = if correct {
                        format!("secret-{stage}")
                    } else {
                        "wrong".to_string()
                    };
                    let id = stages[stage].id.clone();
                    let (outcome, _) = gate.attempt_unlock(&id, &supplied).expect("known stage");
                    if outcome == AttemptOutcome::WrongSecret {
                        prop_assert!(!gate.is_unlocked(&id));
                    }
                }
                GateEvent::MediaCompleted { stage } => {
                    let id = stages[stage % stage_count].id.clone();
                    gate.on_media_completed(&id);
                }
                GateEvent::UnlockDue { stage } => {
                    let id = stages[stage % stage_count].id.clone();
                    gate.on_unlock_due(&id);
                }
                GateEvent::Display { stage } => {
                    let id = stages[stage % stage_count].id.clone();
                    gate.display_stage(&id);
                }
            }

            // Monotonic growth.
            prop_assert!(gate.unlocked().len() >= previous_len);
            previous_len = gate.unlocked().len();

            // No duplicates.
            let mut seen = std::collections::BTreeSet::new();
            for id in gate.unlocked() {
                prop_assert!(seen.insert(id.clone()));
            }

            // Order invariant: each unlocked non-first stage has an
            // unlocked predecessor.
            for (i, stage) in stages.iter().enumerate().skip(1) {
                if gate.is_unlocked(&stage.id) && stage.id != stages[0].id {
                    prop_assert!(
                        gate.is_unlocked(&stages[i - 1].id),
                        "stage {} unlocked without its predecessor",
                        stage.id
                    );
                }
            }

            // Displayed pointer only ever references unlocked stages.
            if let Some(displayed) = gate.displayed() {
                prop_assert!(gate.is_unlocked(displayed));
            }
        }
    }

    /// Repeated media completions never schedule more than one unlock.
    #[test]
    fn media_completion_schedules_at_most_once(repeats in 2usize..10) {
        let stages = stage_sequence(3);
        let mut gate = ProgressionGate::new(GateConfig::new(stages.clone()))
            .expect("valid config");

        let mut scheduled = 0usize;
        for _ in 0..repeats {
            scheduled += gate.on_media_completed(&stages[0].id).len();
        }
        prop_assert_eq!(scheduled, 1);
    }
}
