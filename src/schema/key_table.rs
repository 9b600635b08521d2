//! Measurement key table and line classification
//!
//! E-Prime writes one attribute per line as `Key: value`, indented by frame
//! depth. The table below maps the keys this experiment cares about to the
//! trial field they update. Classification matches keys against the start of
//! the trimmed line; when several registered keys match, the longest wins.

use serde::Serialize;

/// Trial field updated by a measurement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureField {
    Procedure,
    TrialNumber,
    ReactionTime,
    Accuracy,
    Response,
    CorrectAnswer,
    Stimulus,
    Stimuli,
    ClockCheck,
    PmResponseClock,
}

impl MeasureField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureField::Procedure => "procedure",
            MeasureField::TrialNumber => "trialnumber",
            MeasureField::ReactionTime => "rt",
            MeasureField::Accuracy => "accuracy",
            MeasureField::Response => "response",
            MeasureField::CorrectAnswer => "correctanswer",
            MeasureField::Stimulus => "stimulus",
            MeasureField::Stimuli => "stimuli",
            MeasureField::ClockCheck => "timeofclockcheck",
            MeasureField::PmResponseClock => "pmresponseclock",
        }
    }

    /// Fields whose value is parsed as a number
    pub fn is_numeric(&self) -> bool {
        matches!(self, MeasureField::ReactionTime | MeasureField::Accuracy)
    }
}

/// Participant-level field found in the log header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    Subject,
    SessionDate,
}

/// Recognized measurement keys, in log-format spelling
pub const MEASUREMENT_KEYS: &[(&str, MeasureField)] = &[
    ("Procedure:", MeasureField::Procedure),
    ("TBTrialList:", MeasureField::TrialNumber),
    ("LDTrialList:", MeasureField::TrialNumber),
    ("PracTrialList:", MeasureField::TrialNumber),
    ("Stimulus.RT:", MeasureField::ReactionTime),
    ("Stimulus2.RT:", MeasureField::ReactionTime),
    ("Stimulus.ACC:", MeasureField::Accuracy),
    ("Stimulus2.ACC:", MeasureField::Accuracy),
    ("Stimulus.RESP:", MeasureField::Response),
    ("Stimulus2.RESP:", MeasureField::Response),
    ("Stimulus.CRESP:", MeasureField::CorrectAnswer),
    ("Stimulus2.CRESP:", MeasureField::CorrectAnswer),
    ("Stimulus:", MeasureField::Stimulus),
    ("Stimuli:", MeasureField::Stimuli),
    ("TimeOfClockCheck", MeasureField::ClockCheck),
    ("TimeOfPMResponse:", MeasureField::PmResponseClock),
];

/// Participant header keys
pub const HEADER_KEYS: &[(&str, HeaderField)] = &[
    ("Subject:", HeaderField::Subject),
    ("SessionDate:", HeaderField::SessionDate),
];

/// Start-of-frame marker
pub const FRAME_START: &str = "*** LogFrame Start ***";

/// End-of-frame marker
pub const FRAME_END: &str = "*** LogFrame End ***";

/// Longest key in `table` that prefixes the trimmed line
fn longest_prefix<'t, F: Copy>(table: &'t [(&'t str, F)], line: &str) -> Option<(&'t str, F)> {
    let trimmed = line.trim_start();
    table
        .iter()
        .filter(|(key, _)| trimmed.starts_with(key))
        .max_by_key(|(key, _)| key.len())
        .copied()
}

/// Classify a raw line as a measurement, returning the field it updates.
pub fn classify_line(line: &str) -> Option<MeasureField> {
    longest_prefix(MEASUREMENT_KEYS, line).map(|(_, field)| field)
}

/// Classify a raw line as a participant header field.
pub fn classify_header(line: &str) -> Option<HeaderField> {
    longest_prefix(HEADER_KEYS, line).map(|(_, field)| field)
}

/// Registered key matched by a line, if any
pub fn matched_key(line: &str) -> Option<&'static str> {
    longest_prefix(MEASUREMENT_KEYS, line).map(|(key, _)| key)
}
