//! Service layer for the timetable extractor.
//!
//! Components, leaves first:
//! - Session gateway (`PortalSession`, `PageSource`)
//! - Identity locator (`Locator`)
//! - Table extractor (`TableExtractor`)
//! - Week detector (`WeekDetector`)
//! - Cell content parser (`CellParser`)
//! - Schedule assembler (`ScheduleAssembler`)

pub mod assembler;
pub mod cells;
pub mod gateway;
pub mod locator;
pub mod tables;
pub mod week;

pub use assembler::ScheduleAssembler;
pub use cells::{CellFragment, CellParser, LineMatch, LineMatcher, PageVariant};
pub use gateway::{PageSource, PortalSession};
pub use locator::{Locator, PartMatch};
pub use tables::{Grid, TableExtractor};
pub use week::{WeekDetector, detect_caption};
