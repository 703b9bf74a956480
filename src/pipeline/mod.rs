//! Pipeline entry points for timetable extraction.
//!
//! - `Extractor`: resolve, fetch and extract one timetable page
//! - `run_bulk`: extract every group in the configured range

pub mod bulk;
pub mod extract;

pub use bulk::{BulkReport, GroupTimetable, run_bulk};
pub use extract::Extractor;
