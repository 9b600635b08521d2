//! Per-participant aggregation
//!
//! Summary statistics over a participant's sealed trials, scoped by
//! procedure. Every procedure-scoped statistic returns `None` when nothing
//! matches, so "no data" never reads as a measured zero.

use serde::{Deserialize, Serialize};

use crate::types::{CheckpointSlot, Trial};

/// Which trials a reaction-time mean is taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    fn accuracy(&self) -> f64 {
        match self {
            Outcome::Correct => 1.0,
            Outcome::Incorrect => 0.0,
        }
    }
}

/// Aggregation over one participant's trials
#[derive(Debug, Clone, Copy)]
pub struct TrialAggregates<'a> {
    trials: &'a [Trial],
}

impl<'a> TrialAggregates<'a> {
    pub fn new(trials: &'a [Trial]) -> Self {
        Self { trials }
    }

    /// Number of trials recorded for a procedure
    pub fn trial_count(&self, procedure: &str) -> usize {
        self.trials.iter().filter(|t| t.in_procedure(procedure)).count()
    }

    /// Mean accuracy over trials with a valid accuracy value
    pub fn mean_accuracy(&self, procedure: &str) -> Option<f64> {
        mean(
            self.trials
                .iter()
                .filter(|t| t.in_procedure(procedure))
                .filter_map(|t| t.accuracy),
        )
    }

    /// Mean reaction time over responded trials with the given outcome.
    ///
    /// Non-responses never contribute, whatever their accuracy.
    pub fn mean_rt(&self, procedure: &str, outcome: Outcome) -> Option<f64> {
        let wanted = outcome.accuracy();
        mean(
            self.trials
                .iter()
                .filter(|t| t.in_procedure(procedure))
                .filter(|t| t.accuracy == Some(wanted))
                .filter(|t| !t.response.is_non_response())
                .filter_map(|t| t.rt),
        )
    }

    /// Trials in the procedure without a response
    pub fn non_responses(&self, procedure: &str) -> Option<u32> {
        self.count_where(procedure, |t| t.response.is_non_response())
    }

    /// Trials in the procedure where the clock was checked
    pub fn clock_checks(&self, procedure: &str) -> Option<u32> {
        self.count_where(procedure, |t| t.clock_check)
    }

    /// Trials in the procedure with a PM false alarm
    pub fn false_alarms(&self, procedure: &str) -> Option<u32> {
        self.count_where(procedure, |t| t.false_alarm)
    }

    /// 1 if any trial of the participant hit the checkpoint, else 0
    pub fn pm_score(&self, slot: CheckpointSlot) -> f64 {
        if self.trials.iter().any(|t| t.hit(slot)) {
            1.0
        } else {
            0.0
        }
    }

    /// Proportion of checkpoints hit (0, 1/3, 2/3 or 1)
    pub fn total_pm_score(&self) -> f64 {
        CheckpointSlot::ALL
            .iter()
            .map(|slot| self.pm_score(*slot))
            .sum::<f64>()
            / CheckpointSlot::ALL.len() as f64
    }

    fn count_where(&self, procedure: &str, pred: impl Fn(&Trial) -> bool) -> Option<u32> {
        let mut matched = false;
        let mut count = 0;
        for trial in self.trials.iter().filter(|t| t.in_procedure(procedure)) {
            matched = true;
            if pred(trial) {
                count += 1;
            }
        }
        matched.then_some(count)
    }
}

/// Arithmetic mean; `None` for an empty input
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Response;

    fn trial(procedure: &str, accuracy: f64, response: Response, rt: f64) -> Trial {
        Trial {
            procedure: Some(procedure.to_string()),
            trial_number: "1".to_string(),
            stimulus: None,
            stimuli: None,
            accuracy: Some(accuracy),
            correct_answer: None,
            response,
            rt: Some(rt),
            clock_check: false,
            false_alarm: false,
            pm_hits: [false; 3],
        }
    }

    fn given(token: &str) -> Response {
        Response::Given(token.to_string())
    }

    #[test]
    fn test_empty_procedure_has_no_data() {
        let trials = vec![trial("LDTrialProc", 1.0, given("z"), 500.0)];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.mean_accuracy("TBTrialProc"), None);
        assert_eq!(agg.mean_rt("TBTrialProc", Outcome::Correct), None);
        assert_eq!(agg.mean_rt("TBTrialProc", Outcome::Incorrect), None);
        assert_eq!(agg.non_responses("TBTrialProc"), None);
        assert_eq!(agg.clock_checks("TBTrialProc"), None);
        assert_eq!(agg.false_alarms("TBTrialProc"), None);
        assert_eq!(agg.trial_count("TBTrialProc"), 0);
    }

    #[test]
    fn test_mean_accuracy() {
        let trials = vec![
            trial("LDTrialProc", 1.0, given("z"), 500.0),
            trial("LDTrialProc", 0.0, given("m"), 700.0),
            trial("LDTrialProc", 1.0, given("z"), 600.0),
            trial("PracTrialProc", 0.0, given("z"), 900.0),
        ];
        let agg = TrialAggregates::new(&trials);
        let acc = agg.mean_accuracy("LDTrialProc").unwrap();
        assert!((acc - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(agg.mean_accuracy("PracTrialProc"), Some(0.0));
    }

    #[test]
    fn test_rt_means_split_by_outcome_and_skip_non_responses() {
        let trials = vec![
            trial("LDTrialProc", 1.0, given("z"), 500.0),
            trial("LDTrialProc", 1.0, given("z"), 700.0),
            trial("LDTrialProc", 0.0, given("m"), 900.0),
            // Non-response scored incorrect with rt 0: excluded from RT means
            trial("LDTrialProc", 0.0, Response::NoResponse, 0.0),
        ];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.mean_rt("LDTrialProc", Outcome::Correct), Some(600.0));
        assert_eq!(agg.mean_rt("LDTrialProc", Outcome::Incorrect), Some(900.0));
        assert_eq!(agg.non_responses("LDTrialProc"), Some(1));
        // Still counted for accuracy
        assert_eq!(agg.mean_accuracy("LDTrialProc"), Some(0.5));
    }

    #[test]
    fn test_only_non_responses_gives_no_rt() {
        let trials = vec![trial("TBTrialProc", 0.0, Response::NoResponse, 0.0)];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.mean_rt("TBTrialProc", Outcome::Incorrect), None);
        assert_eq!(agg.non_responses("TBTrialProc"), Some(1));
    }

    #[test]
    fn test_missing_accuracy_is_excluded() {
        let mut t = trial("TBTrialProc", 1.0, given("z"), 400.0);
        t.accuracy = None;
        let trials = vec![t, trial("TBTrialProc", 1.0, given("z"), 600.0)];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.mean_accuracy("TBTrialProc"), Some(1.0));
        assert_eq!(agg.mean_rt("TBTrialProc", Outcome::Correct), Some(600.0));
    }

    #[test]
    fn test_clock_checks_and_false_alarms_are_summed() {
        let mut a = trial("TBTrialProc", 1.0, given("z"), 400.0);
        a.clock_check = true;
        a.false_alarm = true;
        let mut b = trial("TBTrialProc", 1.0, given("z"), 400.0);
        b.clock_check = true;
        let mut c = trial("LDTrialProc", 1.0, given("z"), 400.0);
        c.false_alarm = true;
        let trials = vec![a, b, c];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.clock_checks("TBTrialProc"), Some(2));
        assert_eq!(agg.false_alarms("TBTrialProc"), Some(1));
        assert_eq!(agg.clock_checks("LDTrialProc"), Some(0));
    }

    #[test]
    fn test_pm_scores_span_all_procedures() {
        let mut a = trial("TBTrialProc", 1.0, given("z"), 400.0);
        a.pm_hits = [true, false, false];
        let mut b = trial("LDTrialProc", 1.0, given("z"), 400.0);
        b.pm_hits = [true, false, true];
        let trials = vec![a, b];
        let agg = TrialAggregates::new(&trials);
        assert_eq!(agg.pm_score(CheckpointSlot::First), 1.0);
        assert_eq!(agg.pm_score(CheckpointSlot::Second), 0.0);
        assert_eq!(agg.pm_score(CheckpointSlot::Third), 1.0);
        assert!((agg.total_pm_score() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_trials_scores_zero_pm() {
        let agg = TrialAggregates::new(&[]);
        assert_eq!(agg.total_pm_score(), 0.0);
    }
}
