//! Pipeline orchestration
//!
//! Runs each log through decode → segment → summarize. Files are processed
//! one after another in the order given; a file that cannot be read or
//! decoded is reported and skipped so the rest of the batch still produces
//! rows.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::reader::read_log;
use crate::segmenter::TrialSegmenter;
use crate::status::status_from_filename;
use crate::summary::ParticipantSummary;
use crate::types::Participant;

/// Summarize one log already held in memory (stateless, one-shot).
///
/// `file_name` is only used to derive the participant's group.
pub fn log_to_summary(text: &str, file_name: &Path, config: &ExtractConfig) -> ParticipantSummary {
    let processor = ExtractProcessor::new(config);
    processor.process_text(text, file_name).summary
}

/// A successfully processed log
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub participant: Participant,
    pub summary: ParticipantSummary,
}

/// A log that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub processed: Vec<ProcessedFile>,
    pub failures: Vec<FileFailure>,
}

impl BatchResult {
    pub fn summaries(&self) -> impl Iterator<Item = &ParticipantSummary> {
        self.processed.iter().map(|f| &f.summary)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Processor bound to one configuration
pub struct ExtractProcessor<'c> {
    config: &'c ExtractConfig,
    segmenter: TrialSegmenter,
}

impl<'c> ExtractProcessor<'c> {
    pub fn new(config: &'c ExtractConfig) -> Self {
        Self {
            config,
            segmenter: TrialSegmenter::from_config(config),
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        self.config
    }

    /// Process decoded log text
    pub fn process_text(&self, text: &str, path: &Path) -> ProcessedFile {
        let mut participant = self.segmenter.parse_str(text);
        participant.status = status_from_filename(path);
        let summary = ParticipantSummary::from_participant(&participant, self.config);

        info!(
            path = %path.display(),
            id = participant.id.as_deref().unwrap_or("NA"),
            status = participant.status.as_str(),
            trials = participant.trials.len(),
            diagnostics = participant.diagnostics.len(),
            "processed participant log"
        );

        ProcessedFile {
            path: path.to_path_buf(),
            participant,
            summary,
        }
    }

    /// Read, decode and process one log file
    pub fn process_file(&self, path: &Path) -> Result<ProcessedFile, ExtractError> {
        let text = read_log(path)?;
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyLog(path.to_path_buf()));
        }
        Ok(self.process_text(&text, path))
    }

    /// Process files in order, skipping and reporting those that fail
    pub fn process_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Result<BatchResult, ExtractError> {
        if paths.is_empty() {
            return Err(ExtractError::NoInputs);
        }

        let mut result = BatchResult::default();
        for path in paths {
            let path = path.as_ref();
            match self.process_file(path) {
                Ok(file) => result.processed.push(file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping participant log");
                    result.failures.push(FileFailure {
                        path: path.to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(result)
    }
}
