//! Participant group from the log file name
//!
//! Files are named with a four-digit participant code whose first digit is
//! the group (1 = acquired brain injury, 2 = control). Older sessions used a
//! group keyword in the name instead.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::types::ParticipantStatus;

fn code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]{4}").ok()).as_ref()
}

/// Classify a participant by the name of their log file
pub fn status_from_filename(path: &Path) -> ParticipantStatus {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if let Some(code) = code_pattern().and_then(|re| re.find(&name)) {
        return match code.as_str().as_bytes()[0] {
            b'1' => ParticipantStatus::Abi,
            b'2' => ParticipantStatus::Control,
            _ => ParticipantStatus::Unknown,
        };
    }

    if name.contains("abi") {
        ParticipantStatus::Abi
    } else if name.contains("control") {
        ParticipantStatus::Control
    } else {
        ParticipantStatus::Unknown
    }
}
