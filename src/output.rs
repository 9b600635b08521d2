//! Result writers
//!
//! The results table is CSV with a fixed header (one row per participant).
//! NDJSON and a JSON batch report are available for downstream tooling.

use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::pipeline::{BatchResult, FileFailure};
use crate::summary::{header, ParticipantSummary};
use crate::types::Diagnostic;
use crate::{PRODUCER_NAME, TBPM_VERSION};

/// Output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Ndjson,
    Json,
}

/// Write the results table
pub fn write_csv<'a, W, I>(
    writer: W,
    config: &ExtractConfig,
    summaries: I,
) -> Result<(), ExtractError>
where
    W: Write,
    I: IntoIterator<Item = &'a ParticipantSummary>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header(config))?;
    for summary in summaries {
        csv.write_record(summary.to_row())?;
    }
    csv.flush().map_err(|e| ExtractError::Csv(e.into()))?;
    Ok(())
}

/// Write one JSON summary per line
pub fn write_ndjson<'a, W, I>(mut writer: W, summaries: I) -> Result<(), ExtractError>
where
    W: Write,
    I: IntoIterator<Item = &'a ParticipantSummary>,
{
    for summary in summaries {
        serde_json::to_writer(&mut writer, summary)?;
        writer
            .write_all(b"\n")
            .map_err(|e| ExtractError::io("<output>", e))?;
    }
    Ok(())
}

/// Producer metadata stamped on JSON reports
#[derive(Debug, Clone, Serialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Whole-batch JSON report
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<'a> {
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    pub pm_tolerance_sec: f64,
    pub columns: Vec<String>,
    pub participants: Vec<&'a ParticipantSummary>,
    pub failures: &'a [FileFailure],
}

impl<'a> BatchReport<'a> {
    pub fn new(config: &ExtractConfig, batch: &'a BatchResult) -> Self {
        Self {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: TBPM_VERSION.to_string(),
                instance_id: Uuid::new_v4().to_string(),
            },
            generated_at_utc: Utc::now().to_rfc3339(),
            pm_tolerance_sec: config.pm_tolerance_sec,
            columns: header(config),
            participants: batch.summaries().collect(),
            failures: &batch.failures,
        }
    }
}

/// Write the batch in the requested format
pub fn write_batch<W: Write>(
    writer: W,
    format: OutputFormat,
    config: &ExtractConfig,
    batch: &BatchResult,
) -> Result<(), ExtractError> {
    match format {
        OutputFormat::Csv => write_csv(writer, config, batch.summaries()),
        OutputFormat::Ndjson => write_ndjson(writer, batch.summaries()),
        OutputFormat::Json => {
            let report = BatchReport::new(config, batch);
            serde_json::to_writer_pretty(writer, &report)?;
            Ok(())
        }
    }
}

/// A diagnostic with the file it came from
#[derive(Debug, Clone, Serialize)]
struct DiagnosticRecord<'a> {
    file: &'a PathBuf,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

/// Write every file's diagnostics as NDJSON, in batch order
pub fn write_diagnostics<W: Write>(mut writer: W, batch: &BatchResult) -> Result<usize, ExtractError> {
    let mut written = 0;
    for file in &batch.processed {
        for diagnostic in &file.participant.diagnostics {
            let record = DiagnosticRecord {
                file: &file.path,
                diagnostic,
            };
            serde_json::to_writer(&mut writer, &record)?;
            writer
                .write_all(b"\n")
                .map_err(|e| ExtractError::io("<diagnostics>", e))?;
            written += 1;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExtractProcessor;
    use std::path::Path;

    const LOG: &str = "\
Subject: 1042
SessionDate: 03-14-2017
*** LogFrame Start ***
Procedure: TBTrialProc
TBTrialList: 1
Stimulus.ACC: 1
Stimulus.RESP: z
Stimulus.RT: 512
TimeOfPMResponse: 00:06:01
TimeOfPMResponse: 12:00
*** LogFrame End ***
";

    fn batch(config: &ExtractConfig) -> BatchResult {
        let file = ExtractProcessor::new(config).process_text(LOG, Path::new("TBPM-1042-1.txt"));
        BatchResult {
            processed: vec![file],
            failures: vec![FileFailure {
                path: PathBuf::from("TBPM-1043-1.txt"),
                error: "Cannot read TBPM-1043-1.txt".to_string(),
            }],
        }
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let config = ExtractConfig::default();
        let mut out = Vec::new();
        write_batch(&mut out, OutputFormat::Csv, &config, &batch(&config)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("id,status,testdate,Accuracy_PracTrialProc"));
        assert!(header.ends_with("PM_3min,PM_6min,PM_9min,PM_TOTAL"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("1042,ABI,03-14-2017,NA,NA,NA,NA"));
        assert!(row.ends_with("0.0,1.0,0.0,1.0,0.0,0.333"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_ndjson_one_line_per_participant() {
        let config = ExtractConfig::default();
        let mut out = Vec::new();
        write_batch(&mut out, OutputFormat::Ndjson, &config, &batch(&config)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["id"], "1042");
        assert_eq!(value["status"], "ABI");
        assert!(value["procedures"][0]["accuracy"].is_null());
    }

    #[test]
    fn test_json_report_carries_failures() {
        let config = ExtractConfig::default();
        let mut out = Vec::new();
        write_batch(&mut out, OutputFormat::Json, &config, &batch(&config)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["participants"].as_array().unwrap().len(), 1);
        assert_eq!(value["failures"][0]["path"], "TBPM-1043-1.txt");
        assert_eq!(value["pm_tolerance_sec"], 5.0);
    }

    #[test]
    fn test_diagnostics_ndjson() {
        let config = ExtractConfig::default();
        let mut out = Vec::new();
        let written = write_diagnostics(&mut out, &batch(&config)).unwrap();
        assert_eq!(written, 1);
        let value: serde_json::Value =
            serde_json::from_str(String::from_utf8(out).unwrap().trim()).unwrap();
        assert_eq!(value["file"], "TBPM-1042-1.txt");
        assert_eq!(value["kind"], "unparseable_timestamp");
        assert_eq!(value["line"], 10);
    }
}
