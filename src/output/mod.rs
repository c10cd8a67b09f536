//! Output module for persisting harvested pages
//!
//! This module handles:
//! - Streaming fetched pages into the JSON array output file
//! - Recording run statistics for the operator

mod sink;
pub mod stats;

pub use sink::{JsonArraySink, ENVELOPE_CLOSE, ENVELOPE_OPEN, RECORD_SEPARATOR};
pub use stats::{print_statistics, HarvestStats};
