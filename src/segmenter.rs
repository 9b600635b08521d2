//! Trial segmentation
//!
//! Scans the lines of one log and cuts them into trials. A frame-start marker
//! opens a [`TrialBuilder`]; measurement lines fill it; the frame-end marker
//! seals it into a [`Trial`] when it carries a trial number. Subject and
//! session-date header lines update the participant directly, first value
//! wins.

use tracing::{debug, warn};

use crate::config::ExtractConfig;
use crate::pm::{PmEvaluator, PmOutcome};
use crate::schema::{
    classify_header, classify_line, extract_key_value, is_frame_end, is_frame_start,
    HeaderField, MeasureField,
};
use crate::types::{
    CheckpointSlot, Diagnostic, DiagnosticKind, Participant, Response, Trial, NO_VALUE,
};

/// Accumulates the fields of an open trial frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialBuilder {
    procedure: Option<String>,
    trial_number: Option<String>,
    stimulus: Option<String>,
    stimuli: Option<String>,
    accuracy: Option<f64>,
    correct_answer: Option<String>,
    response: Response,
    rt: Option<f64>,
    clock_check: bool,
    false_alarm: bool,
    pm_hits: [bool; 3],
}

impl TrialBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn procedure(&mut self, value: &str) -> &mut Self {
        self.procedure = text_value(value);
        self
    }

    pub fn trial_number(&mut self, value: &str) -> &mut Self {
        self.trial_number = text_value(value);
        self
    }

    pub fn stimulus(&mut self, value: &str) -> &mut Self {
        self.stimulus = text_value(value);
        self
    }

    pub fn stimuli(&mut self, value: &str) -> &mut Self {
        self.stimuli = text_value(value);
        self
    }

    pub fn correct_answer(&mut self, value: &str) -> &mut Self {
        self.correct_answer = text_value(value);
        self
    }

    pub fn response(&mut self, value: &str) -> &mut Self {
        self.response = Response::from_value(value);
        self
    }

    pub fn accuracy(&mut self, value: Option<f64>) -> &mut Self {
        self.accuracy = value;
        self
    }

    pub fn rt(&mut self, value: Option<f64>) -> &mut Self {
        self.rt = value;
        self
    }

    /// Presence of a clock-check line is the signal; repeats change nothing
    pub fn clock_check(&mut self) -> &mut Self {
        self.clock_check = true;
        self
    }

    pub fn false_alarm(&mut self) -> &mut Self {
        self.false_alarm = true;
        self
    }

    pub fn pm_hit(&mut self, slot: CheckpointSlot) -> &mut Self {
        self.pm_hits[slot.index()] = true;
        self
    }

    /// Close the frame. Frames without a trial number are not trials.
    pub fn seal(self) -> Option<Trial> {
        let trial_number = self.trial_number?;
        Some(Trial {
            procedure: self.procedure,
            trial_number,
            stimulus: self.stimulus,
            stimuli: self.stimuli,
            accuracy: self.accuracy,
            correct_answer: self.correct_answer,
            response: self.response,
            rt: self.rt,
            clock_check: self.clock_check,
            false_alarm: self.false_alarm,
            pm_hits: self.pm_hits,
        })
    }
}

/// Textual fields: the `NA` sentinel means absent
fn text_value(value: &str) -> Option<String> {
    if value == NO_VALUE || value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Line-driven state machine producing one [`Participant`] per log
#[derive(Debug, Clone)]
pub struct TrialSegmenter {
    evaluator: PmEvaluator,
}

/// Working state of a single scan
struct Scan {
    participant: Participant,
    open: Option<TrialBuilder>,
    line_no: usize,
}

impl Scan {
    fn diagnose(&mut self, kind: DiagnosticKind, detail: String) {
        warn!(line = self.line_no, kind = ?kind, "{}", detail);
        self.participant.diagnostics.push(Diagnostic {
            kind,
            line: self.line_no,
            detail,
        });
    }

    fn discard_open(&mut self, reason: &str) {
        if let Some(builder) = self.open.take() {
            if !builder.is_empty() {
                self.participant.stats.trials_unsealed += 1;
                self.diagnose(
                    DiagnosticKind::UnsealedTrialDiscarded,
                    format!("trial frame discarded: {}", reason),
                );
            }
        }
    }
}

impl TrialSegmenter {
    pub fn new(evaluator: PmEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(PmEvaluator::from_config(config))
    }

    /// Parse a whole log held in memory
    pub fn parse_str(&self, text: &str) -> Participant {
        self.parse_lines(text.lines())
    }

    /// Parse a sequence of decoded log lines
    pub fn parse_lines<I, S>(&self, lines: I) -> Participant
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scan = Scan {
            participant: Participant::default(),
            open: None,
            line_no: 0,
        };

        for line in lines {
            scan.line_no += 1;
            self.step(&mut scan, line.as_ref());
        }

        scan.participant.stats.lines = scan.line_no;
        scan.discard_open("end of file before frame end");
        scan.participant
    }

    fn step(&self, scan: &mut Scan, line: &str) {
        if let Some(field) = classify_header(line) {
            let value = extract_key_value(line).value;
            if value != NO_VALUE {
                let slot = match field {
                    HeaderField::Subject => &mut scan.participant.id,
                    HeaderField::SessionDate => &mut scan.participant.session_date,
                };
                slot.get_or_insert_with(|| value.to_string());
            }
            return;
        }

        if is_frame_start(line) {
            scan.discard_open("new frame started before frame end");
            scan.open = Some(TrialBuilder::new());
            return;
        }

        if is_frame_end(line) {
            if let Some(builder) = scan.open.take() {
                match builder.seal() {
                    Some(trial) => {
                        debug!(
                            line = scan.line_no,
                            procedure = trial.procedure.as_deref().unwrap_or(NO_VALUE),
                            trial_number = %trial.trial_number,
                            "sealed trial"
                        );
                        scan.participant.stats.trials_sealed += 1;
                        scan.participant.trials.push(trial);
                    }
                    None => scan.participant.stats.trials_without_number += 1,
                }
            }
            return;
        }

        if let Some(field) = classify_line(line) {
            if scan.open.is_none() {
                debug!(line = scan.line_no, field = field.as_str(), "measurement outside trial frame");
                return;
            }
            self.apply_measure(scan, field, extract_key_value(line).value);
        }
    }

    fn apply_measure(&self, scan: &mut Scan, field: MeasureField, value: &str) {
        let numeric = if field.is_numeric() {
            match parse_numeric(value) {
                Ok(n) => n,
                Err(()) => {
                    scan.diagnose(
                        DiagnosticKind::MalformedNumeric,
                        format!("{} value {:?} is not a number", field.as_str(), value),
                    );
                    None
                }
            }
        } else {
            None
        };

        let pm_outcome = match field {
            // A response line without a clock value is absent, not a response
            MeasureField::PmResponseClock if value != NO_VALUE => {
                Some(self.evaluator.evaluate(value))
            }
            _ => None,
        };

        let Some(builder) = scan.open.as_mut() else {
            return;
        };

        match field {
            MeasureField::Procedure => {
                builder.procedure(value);
            }
            MeasureField::TrialNumber => {
                builder.trial_number(value);
            }
            MeasureField::ReactionTime => {
                builder.rt(numeric);
            }
            MeasureField::Accuracy => {
                builder.accuracy(numeric);
            }
            MeasureField::Response => {
                builder.response(value);
            }
            MeasureField::CorrectAnswer => {
                builder.correct_answer(value);
            }
            MeasureField::Stimulus => {
                builder.stimulus(value);
            }
            MeasureField::Stimuli => {
                builder.stimuli(value);
            }
            MeasureField::ClockCheck => {
                builder.clock_check();
            }
            MeasureField::PmResponseClock => {}
        }

        match pm_outcome {
            Some(PmOutcome::Hit {
                slot,
                offset_sec,
                contested,
            }) => {
                builder.pm_hit(slot);
                if contested {
                    scan.diagnose(
                        DiagnosticKind::AmbiguousPmResponse,
                        format!(
                            "PM response {} within tolerance of several checkpoints; scored nearest ({:?}, {}s off)",
                            value, slot, offset_sec
                        ),
                    );
                }
            }
            Some(PmOutcome::FalseAlarm) => {
                builder.false_alarm();
            }
            Some(PmOutcome::Malformed) => {
                builder.false_alarm();
                scan.diagnose(
                    DiagnosticKind::UnparseableTimestamp,
                    format!("PM response clock {:?} is not HH:MM:SS; scored as false alarm", value),
                );
            }
            Some(PmOutcome::Ambiguous { slots }) => {
                scan.diagnose(
                    DiagnosticKind::AmbiguousPmResponse,
                    format!(
                        "PM response {} equally close to checkpoints {:?}; not scored",
                        value, slots
                    ),
                );
            }
            None => {}
        }
    }
}

/// `NA` is an absent value; anything else must parse as a finite float.
fn parse_numeric(value: &str) -> Result<Option<f64>, ()> {
    if value == NO_VALUE {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(()),
    }
}
