//! Core types for the extraction pipeline
//!
//! This module defines the records that flow between stages: sealed trials,
//! the participant record assembled from one log file, and the diagnostics
//! collected while parsing it.

use serde::{Deserialize, Serialize};

/// Sentinel value for a key line that carries no value token
pub const NO_VALUE: &str = "NA";

/// Experimental group, derived from the log file name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    #[serde(rename = "ABI")]
    Abi,
    Control,
    #[default]
    #[serde(rename = "UnableToGenerate")]
    Unknown,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Abi => "ABI",
            ParticipantStatus::Control => "Control",
            ParticipantStatus::Unknown => "UnableToGenerate",
        }
    }
}

/// Observed response of a trial
///
/// `Unrecorded` (no response line at all) and `NoResponse` (a response line
/// with no value) are different: only the latter is a non-response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "token")]
pub enum Response {
    #[default]
    Unrecorded,
    NoResponse,
    Given(String),
}

impl Response {
    /// Build a response from an extracted value token
    pub fn from_value(value: &str) -> Self {
        if value == NO_VALUE {
            Response::NoResponse
        } else {
            Response::Given(value.to_string())
        }
    }

    pub fn is_non_response(&self) -> bool {
        matches!(self, Response::NoResponse)
    }
}

/// One of the three scheduled prospective-memory checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSlot {
    First,
    Second,
    Third,
}

impl CheckpointSlot {
    pub const ALL: [CheckpointSlot; 3] = [
        CheckpointSlot::First,
        CheckpointSlot::Second,
        CheckpointSlot::Third,
    ];

    pub fn index(&self) -> usize {
        match self {
            CheckpointSlot::First => 0,
            CheckpointSlot::Second => 1,
            CheckpointSlot::Third => 2,
        }
    }
}

/// A sealed trial record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Procedure tag (e.g. `LDTrialProc`)
    pub procedure: Option<String>,
    /// Position in the trial list; always non-empty on a sealed trial
    pub trial_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimuli: Option<String>,
    /// 1 = correct, 0 = incorrect; `None` when absent or malformed
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub response: Response,
    /// Reaction time as logged (ms); `None` when absent or malformed
    pub rt: Option<f64>,
    /// Participant looked at the clock during this trial
    pub clock_check: bool,
    /// A PM response fell outside every checkpoint window
    pub false_alarm: bool,
    /// Checkpoint hits, indexed by [`CheckpointSlot::index`]
    pub pm_hits: [bool; 3],
}

impl Trial {
    pub fn in_procedure(&self, procedure: &str) -> bool {
        self.procedure.as_deref() == Some(procedure)
    }

    pub fn hit(&self, slot: CheckpointSlot) -> bool {
        self.pm_hits[slot.index()]
    }
}

/// Kind of non-fatal anomaly found while parsing a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Non-numeric token in a numeric field; the field is left empty
    MalformedNumeric,
    /// PM response clock that is not `HH:MM:SS`; scored as a false alarm
    UnparseableTimestamp,
    /// PM response within tolerance of more than one checkpoint
    AmbiguousPmResponse,
    /// Trial opened but never closed before end of file
    UnsealedTrialDiscarded,
}

/// A data-quality warning tied to a log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based line number in the log
    pub line: usize,
    pub detail: String,
}

/// Counters from one segmenter run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub lines: usize,
    pub trials_sealed: usize,
    /// Closed trials without a trial number (header/boilerplate frames)
    pub trials_without_number: usize,
    pub trials_unsealed: usize,
}

/// One processed log file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Option<String>,
    pub session_date: Option<String>,
    pub status: ParticipantStatus,
    pub trials: Vec<Trial>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ParseStats,
}

impl Participant {
    pub fn count_diagnostics(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}
