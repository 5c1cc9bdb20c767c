//! Report formats and statistics.
//!
//! The generator renders outcome slices into the three report formats;
//! the stats helpers carry the thresholds the combined format derives
//! its recommendations from.

pub mod generator;
pub mod stats;

pub use generator::{ReportStyle, Reporter};
