//! Flat per-participant summary
//!
//! Collapses a parsed participant into the record written as one row of the
//! results table: identity fields, per-procedure accuracy and reaction-time
//! statistics, and the prospective-memory scores.

use serde::Serialize;

use crate::aggregate::{Outcome, TrialAggregates};
use crate::config::ExtractConfig;
use crate::types::{CheckpointSlot, Participant, ParticipantStatus, NO_VALUE};

/// Statistics for one procedure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureSummary {
    pub procedure: String,
    pub trials: usize,
    pub accuracy: Option<f64>,
    pub correct_rt: Option<f64>,
    pub incorrect_rt: Option<f64>,
    pub non_responses: Option<u32>,
}

/// Prospective-memory scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PmSummary {
    /// Checkpoint minutes, in slot order
    pub checkpoint_minutes: [u32; 3],
    /// 1.0 when the checkpoint was hit in any trial
    pub hits: [f64; 3],
    /// Proportion of checkpoints hit
    pub total: f64,
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSummary {
    pub id: Option<String>,
    pub status: ParticipantStatus,
    pub session_date: Option<String>,
    pub procedures: Vec<ProcedureSummary>,
    /// Reported for the configured PM procedure
    pub clock_checks: Option<u32>,
    pub false_alarms: Option<u32>,
    pub pm: PmSummary,
    pub diagnostics: usize,
}

impl ParticipantSummary {
    pub fn from_participant(participant: &Participant, config: &ExtractConfig) -> Self {
        let agg = TrialAggregates::new(&participant.trials);
        let schedule = config.checkpoint_schedule();

        let procedures = config
            .procedures
            .iter()
            .map(|procedure| ProcedureSummary {
                procedure: procedure.clone(),
                trials: agg.trial_count(procedure),
                accuracy: agg.mean_accuracy(procedure),
                correct_rt: agg.mean_rt(procedure, Outcome::Correct),
                incorrect_rt: agg.mean_rt(procedure, Outcome::Incorrect),
                non_responses: agg.non_responses(procedure),
            })
            .collect();

        let pm = PmSummary {
            checkpoint_minutes: CheckpointSlot::ALL.map(|slot| schedule.minute(slot)),
            hits: CheckpointSlot::ALL.map(|slot| agg.pm_score(slot)),
            total: agg.total_pm_score(),
        };

        Self {
            id: participant.id.clone(),
            status: participant.status,
            session_date: participant.session_date.clone(),
            procedures,
            clock_checks: agg.clock_checks(&config.pm_procedure),
            false_alarms: agg.false_alarms(&config.pm_procedure),
            pm,
            diagnostics: participant.diagnostics.len(),
        }
    }

    /// Render as table cells, in [`header`] order
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            text_cell(self.id.as_deref()),
            self.status.as_str().to_string(),
            text_cell(self.session_date.as_deref()),
        ];

        for p in &self.procedures {
            row.push(mean_cell(p.accuracy));
            row.push(mean_cell(p.correct_rt));
            row.push(mean_cell(p.incorrect_rt));
            row.push(count_cell(p.non_responses));
        }

        row.push(count_cell(self.clock_checks));
        row.push(count_cell(self.false_alarms));
        for hit in self.pm.hits {
            row.push(format!("{:.1}", hit));
        }
        row.push(format!("{:.3}", self.pm.total));
        row
    }
}

/// Column names of the results table
pub fn header(config: &ExtractConfig) -> Vec<String> {
    let mut columns = vec!["id".to_string(), "status".to_string(), "testdate".to_string()];

    for p in &config.procedures {
        columns.push(format!("Accuracy_{}", p));
        columns.push(format!("CorrectRT_{}", p));
        columns.push(format!("IncorrectRT_{}", p));
        columns.push(format!("TotalNonResponses_{}", p));
    }

    columns.push("ClockChecks_TOTAL".to_string());
    columns.push("FalseAlarm_TOTAL".to_string());
    let schedule = config.checkpoint_schedule();
    for cp in schedule.checkpoints() {
        columns.push(format!("PM_{}min", cp.minute));
    }
    columns.push("PM_TOTAL".to_string());
    columns
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or(NO_VALUE).to_string()
}

fn mean_cell(value: Option<f64>) -> String {
    value.map_or_else(|| NO_VALUE.to_string(), |v| format!("{:.4}", v))
}

fn count_cell(value: Option<u32>) -> String {
    value.map_or_else(|| NO_VALUE.to_string(), |v| format!("{:.1}", f64::from(v)))
}
