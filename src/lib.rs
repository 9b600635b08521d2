//! TBPM Extract - trial measurements and prospective-memory scores from E-Prime logs
//!
//! Each participant's E-Prime text log is pushed through a deterministic
//! pipeline: decoding → trial segmentation → per-procedure aggregation →
//! one flat summary row.
//!
//! ## Modules
//!
//! - **Log format** (`schema`): frame markers, measurement keys, key/value extraction
//! - **PM scoring** (`pm`): time-based prospective-memory checkpoint evaluation
//! - **Segmentation** (`segmenter`): line state machine producing sealed trials
//! - **Aggregation** (`aggregate`, `summary`): participant statistics and table rows

pub mod aggregate;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pm;
pub mod reader;
pub mod schema;
pub mod segmenter;
pub mod status;
pub mod summary;
pub mod types;

pub use config::ExtractConfig;
pub use error::ExtractError;
pub use pipeline::{log_to_summary, BatchResult, ExtractProcessor};
pub use pm::{CheckpointSchedule, PmEvaluator, PmOutcome};
pub use segmenter::TrialSegmenter;
pub use summary::ParticipantSummary;
pub use types::{Participant, ParticipantStatus, Trial};

/// Version embedded in JSON reports
pub const TBPM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for JSON reports
pub const PRODUCER_NAME: &str = "tbpm-extract";
