//! Lesson records and the per-page extraction result.

use std::fmt;

use serde::{Serialize, Serializer};

/// Placeholder shown when a cell names no instructor or group.
pub const UNKNOWN_PERSON: &str = "Не указан";

/// Placeholder shown when a cell names no room.
pub const UNKNOWN_ROOM: &str = "Не указана";

/// Placeholder shown when a cell has no subject text.
pub const UNKNOWN_SUBJECT: &str = "Не указано";

/// Bell schedule, indexed by pair number minus one.
const TIME_SLOTS: [&str; 8] = [
    "08:30-09:50",
    "10:00-11:20",
    "11:30-12:50",
    "13:30-14:50",
    "15:00-16:20",
    "16:30-17:50",
    "18:00-19:20",
    "19:30-20:50",
];

/// Day label of a timetable row.
///
/// Rows beyond Saturday are labelled generically rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    /// A row past the known weekdays, numbered from 1
    Extra(usize),
}

impl Day {
    pub const WEEKDAYS: [Day; 6] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri, Day::Sat];

    /// Day for the zero-based data row index.
    pub fn from_row(index: usize) -> Self {
        Self::WEEKDAYS
            .get(index)
            .copied()
            .unwrap_or(Day::Extra(index + 1))
    }

    /// Short Russian label as printed on the portal.
    pub fn label(&self) -> String {
        match self {
            Day::Mon => "Пн".into(),
            Day::Tue => "Вт".into(),
            Day::Wed => "Ср".into(),
            Day::Thu => "Чт".into(),
            Day::Fri => "Пт".into(),
            Day::Sat => "Сб".into(),
            Day::Extra(n) => format!("День{n}"),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// Kind of lesson, classified from the subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LessonType {
    #[default]
    Lecture,
    Practice,
    Lab,
    Seminar,
    Test,
    Exam,
}

impl LessonType {
    /// Display name used by the renderer.
    pub fn label(&self) -> &'static str {
        match self {
            LessonType::Lecture => "Лекция",
            LessonType::Practice => "Практика",
            LessonType::Lab => "Лабораторная",
            LessonType::Seminar => "Семинар",
            LessonType::Test => "Зачёт",
            LessonType::Exam => "Экзамен",
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LessonType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One populated timetable cell, fully resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonRecord {
    pub week: u32,
    pub day: Day,
    pub pair: u8,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: LessonType,
    /// Instructor on group pages, group on instructor pages
    pub person: String,
    pub room: String,
}

impl LessonRecord {
    /// Start and end time of the pair, if it is a regular slot.
    pub fn time_slot(&self) -> Option<&'static str> {
        usize::from(self.pair)
            .checked_sub(1)
            .and_then(|i| TIME_SLOTS.get(i))
            .copied()
    }
}

/// Everything extracted from one timetable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub resolved_name: String,
    pub week: String,
    pub lessons: Vec<LessonRecord>,
}

impl ExtractionResult {
    /// Result used when the page could not be fetched.
    pub fn empty(resolved_name: impl Into<String>) -> Self {
        Self {
            resolved_name: resolved_name.into(),
            week: "1".into(),
            lessons: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_past_saturday_get_generic_labels() {
        assert_eq!(Day::from_row(0), Day::Mon);
        assert_eq!(Day::from_row(5), Day::Sat);
        assert_eq!(Day::from_row(6).label(), "День7");
    }

    #[test]
    fn time_slots_cover_eight_pairs() {
        let mut record = LessonRecord {
            week: 1,
            day: Day::Mon,
            pair: 1,
            subject: "Математика".into(),
            kind: LessonType::Lecture,
            person: UNKNOWN_PERSON.into(),
            room: UNKNOWN_ROOM.into(),
        };
        assert_eq!(record.time_slot(), Some("08:30-09:50"));
        record.pair = 8;
        assert_eq!(record.time_slot(), Some("19:30-20:50"));
        record.pair = 9;
        assert_eq!(record.time_slot(), None);
    }

    #[test]
    fn serializes_with_display_labels() {
        let record = LessonRecord {
            week: 3,
            day: Day::Wed,
            pair: 4,
            subject: "Базы данных".into(),
            kind: LessonType::Lab,
            person: "Кузнецов К К".into(),
            room: "ауд. 3-410".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["day"], "Ср");
        assert_eq!(json["type"], "Лабораторная");
    }
}
