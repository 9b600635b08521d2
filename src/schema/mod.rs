//! E-Prime log format
//!
//! This module knows how the instrument writes its text logs: the frame
//! markers that delimit trials, the attribute keys that carry measurements,
//! and how a value is pulled out of a `Key: value` line.

mod key_table;
mod line;

pub use key_table::*;
pub use line::*;
