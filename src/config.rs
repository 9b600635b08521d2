//! Extraction settings
//!
//! Settings come from the lab's `settings.ini` (section `[global]`), then
//! environment variables prefixed `TBPM__` (e.g. `TBPM__GLOBAL__PMTHRESHOLD`),
//! then command-line overrides. The resulting [`ExtractConfig`] is built once
//! and passed by reference into every stage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ExtractError;
use crate::pm::CheckpointSchedule;

/// Default settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "settings.ini";

/// Default PM scoring tolerance in seconds
pub const DEFAULT_PM_TOLERANCE_SEC: f64 = 5.0;

/// Procedures reported in the summary table, in column order
pub const DEFAULT_PROCEDURES: [&str; 3] = ["PracTrialProc", "LDTrialProc", "TBTrialProc"];

/// Procedure whose clock checks and false alarms are reported
pub const DEFAULT_PM_PROCEDURE: &str = "TBTrialProc";

/// Checkpoints are three minutes apart, so tolerances at or above half of
/// that make two windows overlap.
const OVERLAP_TOLERANCE_SEC: f64 = 90.0;

/// Raw `settings.ini` layout
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    global: GlobalSection,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalSection {
    pmthreshold: Option<f64>,
    outfilename: Option<String>,
    pmcheckpoint: Option<u32>,
    /// Comma-separated procedure names
    procedures: Option<String>,
    pmprocedure: Option<String>,
}

/// Validated extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Max distance (seconds) between a PM response and a checkpoint for a hit
    pub pm_tolerance_sec: f64,
    /// Where the summary table is written
    pub output_path: PathBuf,
    /// Minute of the middle checkpoint (6 or 7 depending on task version)
    pub middle_checkpoint_min: u32,
    pub procedures: Vec<String>,
    pub pm_procedure: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pm_tolerance_sec: DEFAULT_PM_TOLERANCE_SEC,
            output_path: PathBuf::from("results.csv"),
            middle_checkpoint_min: 6,
            procedures: DEFAULT_PROCEDURES.iter().map(|p| p.to_string()).collect(),
            pm_procedure: DEFAULT_PM_PROCEDURE.to_string(),
        }
    }
}

impl ExtractConfig {
    /// Load settings from an INI file and the environment.
    ///
    /// An explicitly given file must exist; the default `settings.ini` is
    /// optional and defaults apply when it is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractError> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        };

        let settings = config::Config::builder()
            .add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Ini)
                    .required(required),
            )
            .add_source(config::Environment::with_prefix("TBPM").separator("__"))
            .build()?;

        Self::from_settings(settings)
    }

    /// Load settings from INI text only (no environment).
    pub fn from_ini_str(ini: &str) -> Result<Self, ExtractError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(ini, config::FileFormat::Ini))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> Result<Self, ExtractError> {
        let raw: SettingsFile = settings.try_deserialize()?;
        let defaults = Self::default();
        let global = raw.global;

        let procedures = match global.procedures {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.procedures,
        };

        let config = Self {
            pm_tolerance_sec: global.pmthreshold.unwrap_or(defaults.pm_tolerance_sec),
            output_path: global
                .outfilename
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            middle_checkpoint_min: global
                .pmcheckpoint
                .unwrap_or(defaults.middle_checkpoint_min),
            procedures,
            pm_procedure: global.pmprocedure.unwrap_or(defaults.pm_procedure),
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the PM tolerance
    pub fn with_tolerance(mut self, seconds: f64) -> Result<Self, ExtractError> {
        self.pm_tolerance_sec = seconds;
        self.validate()?;
        Ok(self)
    }

    /// Override the output path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !self.pm_tolerance_sec.is_finite() || self.pm_tolerance_sec < 0.0 {
            return Err(ExtractError::Config(format!(
                "pmthreshold must be a non-negative number of seconds, got {}",
                self.pm_tolerance_sec
            )));
        }

        if !matches!(self.middle_checkpoint_min, 6 | 7) {
            return Err(ExtractError::Config(format!(
                "pmcheckpoint must be 6 or 7, got {}",
                self.middle_checkpoint_min
            )));
        }

        if self.procedures.is_empty() {
            return Err(ExtractError::Config(
                "procedures must name at least one procedure".into(),
            ));
        }

        if self.pm_tolerance_sec >= OVERLAP_TOLERANCE_SEC {
            warn!(
                tolerance_sec = self.pm_tolerance_sec,
                "PM tolerance lets checkpoint windows overlap; some responses will be ambiguous"
            );
        }

        Ok(())
    }

    /// Checkpoint schedule implied by this configuration
    pub fn checkpoint_schedule(&self) -> CheckpointSchedule {
        CheckpointSchedule::with_middle_minute(self.middle_checkpoint_min)
    }
}
