// src/services/assembler.rs

//! Schedule assembler.
//!
//! Walks extracted grids row-major and turns every populated cell into a
//! [`LessonRecord`]. Row index maps to weekday, column index to pair number.

use crate::models::{
    Day, ExtractionConfig, LessonRecord, UNKNOWN_PERSON, UNKNOWN_ROOM, UNKNOWN_SUBJECT,
};
use crate::services::cells::{CellFragment, CellParser, PageVariant};
use crate::services::tables::Grid;

#[derive(Debug, Clone)]
pub struct ScheduleAssembler {
    header_rows: usize,
    max_pairs: usize,
}

impl ScheduleAssembler {
    pub fn new(header_rows: usize, max_pairs: usize) -> Self {
        Self {
            header_rows,
            max_pairs,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.header_rows, config.max_pairs)
    }

    /// Lessons of the first grid that yields any.
    pub fn assemble(&self, grids: &[Grid], week: u32, variant: PageVariant) -> Vec<LessonRecord> {
        let parser = CellParser::new(variant);

        for (index, grid) in grids.iter().enumerate() {
            let lessons = self.assemble_grid(grid, week, &parser);
            if !lessons.is_empty() {
                log::debug!("Grid {index} yielded {} lesson(s)", lessons.len());
                return lessons;
            }
        }
        Vec::new()
    }

    fn assemble_grid(&self, grid: &Grid, week: u32, parser: &CellParser) -> Vec<LessonRecord> {
        let mut lessons = Vec::new();

        for (row_index, row) in grid.rows.iter().enumerate().skip(self.header_rows) {
            if row.len() < 2 {
                continue;
            }
            let day = Day::from_row(row_index - self.header_rows);

            for (pair, text) in row.iter().enumerate().skip(1).take(self.max_pairs) {
                match parser.parse(text) {
                    Ok(Some(fragment)) => {
                        lessons.push(into_record(fragment, week, day, pair_number(pair)));
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Skipping cell {day} pair {pair}: {e}"),
                }
            }
        }
        lessons
    }
}

impl Default for ScheduleAssembler {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

fn pair_number(column: usize) -> u8 {
    u8::try_from(column).unwrap_or(u8::MAX)
}

/// Resolve absent fields to their display placeholders.
fn into_record(fragment: CellFragment, week: u32, day: Day, pair: u8) -> LessonRecord {
    LessonRecord {
        week,
        day,
        pair,
        subject: fragment.subject.unwrap_or_else(|| UNKNOWN_SUBJECT.to_string()),
        kind: fragment.kind,
        person: fragment.person.unwrap_or_else(|| UNKNOWN_PERSON.to_string()),
        room: fragment.room.unwrap_or_else(|| UNKNOWN_ROOM.to_string()),
    }
}
