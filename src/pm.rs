//! Prospective-memory response scoring
//!
//! During the time-based block the participant must press a key at three
//! scheduled clock times. Each `TimeOfPMResponse` value is compared against
//! the checkpoint schedule; a response within the configured tolerance of a
//! checkpoint is a hit for that checkpoint, anything else is a false alarm.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::config::ExtractConfig;
use crate::types::CheckpointSlot;

/// Clock format used for PM response times
const CLOCK_FORMAT: &str = "%H:%M:%S";

/// A scheduled checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub slot: CheckpointSlot,
    /// Minutes into the block
    pub minute: u32,
}

impl Checkpoint {
    fn seconds(&self) -> i64 {
        i64::from(self.minute) * 60
    }
}

/// The three checkpoints of the time-based task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckpointSchedule {
    checkpoints: [Checkpoint; 3],
}

impl Default for CheckpointSchedule {
    fn default() -> Self {
        Self::with_middle_minute(6)
    }
}

impl CheckpointSchedule {
    /// Schedule at 3, `middle`, and 9 minutes
    pub fn with_middle_minute(middle: u32) -> Self {
        Self {
            checkpoints: [
                Checkpoint {
                    slot: CheckpointSlot::First,
                    minute: 3,
                },
                Checkpoint {
                    slot: CheckpointSlot::Second,
                    minute: middle,
                },
                Checkpoint {
                    slot: CheckpointSlot::Third,
                    minute: 9,
                },
            ],
        }
    }

    pub fn checkpoints(&self) -> &[Checkpoint; 3] {
        &self.checkpoints
    }

    pub fn minute(&self, slot: CheckpointSlot) -> u32 {
        self.checkpoints[slot.index()].minute
    }
}

/// Result of scoring one PM response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PmOutcome {
    /// Within tolerance of `slot`. `contested` is set when another
    /// checkpoint was also within tolerance but further away.
    Hit {
        slot: CheckpointSlot,
        offset_sec: f64,
        contested: bool,
    },
    /// Outside every checkpoint window
    FalseAlarm,
    /// Equally close to several checkpoints inside tolerance
    Ambiguous { slots: Vec<CheckpointSlot> },
    /// Not an `HH:MM:SS` clock value
    Malformed,
}

/// Scores PM response clock values against a checkpoint schedule
#[derive(Debug, Clone, Copy)]
pub struct PmEvaluator {
    schedule: CheckpointSchedule,
    tolerance_sec: f64,
}

impl PmEvaluator {
    pub fn new(schedule: CheckpointSchedule, tolerance_sec: f64) -> Self {
        Self {
            schedule,
            tolerance_sec,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.checkpoint_schedule(), config.pm_tolerance_sec)
    }

    pub fn schedule(&self) -> &CheckpointSchedule {
        &self.schedule
    }

    /// Score a response clock value.
    ///
    /// The nearest checkpoint within tolerance wins.
    pub fn evaluate(&self, clock: &str) -> PmOutcome {
        let Ok(time) = NaiveTime::parse_from_str(clock.trim(), CLOCK_FORMAT) else {
            return PmOutcome::Malformed;
        };
        // chrono reads second 60 as a leap second; a task clock never shows one
        if time.nanosecond() >= 1_000_000_000 {
            return PmOutcome::Malformed;
        }
        let response_sec = i64::from(time.num_seconds_from_midnight());

        let within: Vec<(CheckpointSlot, f64)> = self
            .schedule
            .checkpoints()
            .iter()
            .map(|cp| (cp.slot, (response_sec - cp.seconds()).abs() as f64))
            .filter(|(_, offset)| *offset <= self.tolerance_sec)
            .collect();

        let Some(best) = within
            .iter()
            .map(|(_, offset)| *offset)
            .min_by(|a, b| a.total_cmp(b))
        else {
            return PmOutcome::FalseAlarm;
        };

        let nearest: Vec<CheckpointSlot> = within
            .iter()
            .filter(|(_, offset)| *offset == best)
            .map(|(slot, _)| *slot)
            .collect();

        match nearest.as_slice() {
            [slot] => PmOutcome::Hit {
                slot: *slot,
                offset_sec: best,
                contested: within.len() > 1,
            },
            _ => PmOutcome::Ambiguous { slots: nearest },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn evaluator(tolerance: f64) -> PmEvaluator {
        PmEvaluator::new(CheckpointSchedule::default(), tolerance)
    }

    #[test]
    fn test_hit_within_tolerance() {
        let outcome = evaluator(5.0).evaluate("00:03:02");
        assert_eq!(
            outcome,
            PmOutcome::Hit {
                slot: CheckpointSlot::First,
                offset_sec: 2.0,
                contested: false,
            }
        );
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let outcome = evaluator(5.0).evaluate("00:08:55");
        assert!(matches!(
            outcome,
            PmOutcome::Hit {
                slot: CheckpointSlot::Third,
                ..
            }
        ));
        assert_eq!(evaluator(5.0).evaluate("00:08:54"), PmOutcome::FalseAlarm);
    }

    #[test]
    fn test_early_and_late_responses_both_count() {
        let e = evaluator(10.0);
        assert!(matches!(e.evaluate("00:05:51"), PmOutcome::Hit { slot: CheckpointSlot::Second, .. }));
        assert!(matches!(e.evaluate("00:06:09"), PmOutcome::Hit { slot: CheckpointSlot::Second, .. }));
    }

    #[test]
    fn test_false_alarm() {
        assert_eq!(evaluator(5.0).evaluate("00:04:30"), PmOutcome::FalseAlarm);
    }

    #[test]
    fn test_malformed_clock() {
        let e = evaluator(5.0);
        assert_eq!(e.evaluate("NA"), PmOutcome::Malformed);
        assert_eq!(e.evaluate("3 minutes"), PmOutcome::Malformed);
        assert_eq!(e.evaluate("00:03:00pm"), PmOutcome::Malformed);
    }

    #[test]
    fn test_leap_second_is_malformed() {
        let e = evaluator(0.0);
        assert_eq!(e.evaluate("00:02:60"), PmOutcome::Malformed);
        assert_eq!(evaluator(5.0).evaluate("00:02:60"), PmOutcome::Malformed);
        assert!(matches!(e.evaluate("00:02:59"), PmOutcome::FalseAlarm));
    }

    #[test]
    fn test_middle_checkpoint_variant() {
        let e = PmEvaluator::new(CheckpointSchedule::with_middle_minute(7), 5.0);
        assert!(matches!(e.evaluate("00:07:01"), PmOutcome::Hit { slot: CheckpointSlot::Second, .. }));
        assert_eq!(e.evaluate("00:06:00"), PmOutcome::FalseAlarm);
    }

    #[test]
    fn test_nearest_checkpoint_wins_when_windows_overlap() {
        // 120 s tolerance: 00:04:20 is 80 s after 3 min and 100 s before 6 min.
        let outcome = evaluator(120.0).evaluate("00:04:20");
        assert_eq!(
            outcome,
            PmOutcome::Hit {
                slot: CheckpointSlot::First,
                offset_sec: 80.0,
                contested: true,
            }
        );
    }

    #[test]
    fn test_equidistant_response_is_ambiguous() {
        let outcome = evaluator(90.0).evaluate("00:04:30");
        assert_eq!(
            outcome,
            PmOutcome::Ambiguous {
                slots: vec![CheckpointSlot::First, CheckpointSlot::Second],
            }
        );
    }

    #[test]
    fn test_zero_tolerance_requires_exact_time() {
        let e = evaluator(0.0);
        assert!(matches!(e.evaluate("00:09:00"), PmOutcome::Hit { .. }));
        assert_eq!(e.evaluate("00:09:01"), PmOutcome::FalseAlarm);
    }
}
