// src/services/cells.rs

//! Cell content parser.
//!
//! Turns the free text of one timetable cell into a lesson fragment. The
//! first line carries the subject and lesson type; the second line carries
//! the instructor (or group, on instructor pages) and usually the room, with
//! no fixed separator between them. Person and room are pulled out by an
//! ordered list of matchers, most structured first, loosest last.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::LessonType;

/// Room token: `3-312`, `3_2`, `2-ДОТ`, `2_ДОТ` or `2 ДОТ`.
const ROOM_TOKEN: &str = r"\d+(?:[-_][0-9A-Za-zА-Яа-яЁё]+|\s+(?i:дот))";

/// "Surname I I <room>", e.g. "Кузнецов К К 3-410" or "Петров П.П. 2_ДОТ".
static STRUCTURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?P<person>[А-ЯЁ][а-яё]+(?:-[А-ЯЁ][а-яё]+)?\s+[А-ЯЁ]\.?(?:\s*[А-ЯЁ]\.?)?)\s+(?P<room>{ROOM_TOKEN})\b"
    ))
    .expect("valid structured pattern")
});

/// A room token standing alone on a line.
static BARE_ROOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<room>{ROOM_TOKEN})$")).expect("valid room pattern")
});

/// A standalone "ауд. <token>" or "ауд <token>" occurrence.
static AUDITORIUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bауд(?:\.\s*|\s+)([^\s,;]+)").expect("valid auditorium pattern")
});

/// Group name such as "ИВТИИбд-32" or "ПИбд-31".
static GROUP_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[А-ЯЁA-Z]{2,}[а-яёa-z]*-\d+[а-яёa-z]*").expect("valid group pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Lesson-type markers searched for in the subject line, in priority order.
const TYPE_MARKERS: [(&str, LessonType); 8] = [
    ("лек.", LessonType::Lecture),
    ("пр.", LessonType::Practice),
    ("практ", LessonType::Practice),
    ("лаб.", LessonType::Lab),
    ("лабор", LessonType::Lab),
    ("сем.", LessonType::Seminar),
    ("зач.", LessonType::Test),
    ("экз.", LessonType::Exam),
];

/// Abbreviations removed from the subject; the first one present goes.
const ABBREVIATIONS: [&str; 6] = ["лек.", "пр.", "лаб.", "сем.", "зач.", "экз."];

static MARKER_PATTERNS: LazyLock<Vec<(Regex, LessonType)>> = LazyLock::new(|| {
    TYPE_MARKERS
        .iter()
        .map(|(needle, kind)| (case_insensitive(needle), *kind))
        .collect()
});

static ABBREVIATION_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| ABBREVIATIONS.iter().map(|a| case_insensitive(a)).collect());

/// Cell texts that mean "no lesson here".
const EMPTY_CELLS: [&str; 3] = ["", "-", "—"];

/// Which kind of timetable page a cell comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageVariant {
    /// Group page: cells name the instructor
    #[default]
    Group,
    /// Instructor page: cells name the group
    Teacher,
}

/// Structured content of one cell.
///
/// Absent fields stay `None` here; display placeholders are applied when
/// the fragment becomes a lesson record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFragment {
    pub subject: Option<String>,
    pub kind: LessonType,
    pub person: Option<String>,
    pub room: Option<String>,
}

/// Person and room recognized on one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMatch {
    pub person: Option<String>,
    pub room: Option<String>,
}

/// One step of the person/room cascade.
///
/// Returns `None` to pass the line on to the next matcher.
pub trait LineMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_match(&self, line: &str) -> Option<LineMatch>;
}

/// "Surname I I <room>" with a structured room token.
pub struct StructuredMatcher;

impl LineMatcher for StructuredMatcher {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn try_match(&self, line: &str) -> Option<LineMatch> {
        let caps = STRUCTURED.captures(line)?;
        Some(LineMatch {
            person: non_empty(&caps["person"]),
            room: Some(room_from_token(&caps["room"])),
        })
    }
}

/// "ауд. <token>" anywhere on the line; the rest is the person.
pub struct AuditoriumMatcher;

impl LineMatcher for AuditoriumMatcher {
    fn name(&self) -> &'static str {
        "auditorium"
    }

    fn try_match(&self, line: &str) -> Option<LineMatch> {
        let caps = AUDITORIUM.captures(line)?;
        let whole = caps.get(0)?;
        let rest = format!("{} {}", &line[..whole.start()], &line[whole.end()..]);
        Some(LineMatch {
            person: non_empty(&rest),
            room: Some(format!("ауд. {}", &caps[1])),
        })
    }
}

/// A bare room token making up the whole line.
pub struct BareRoomMatcher;

impl LineMatcher for BareRoomMatcher {
    fn name(&self) -> &'static str {
        "bare-room"
    }

    fn try_match(&self, line: &str) -> Option<LineMatch> {
        let line = clean(line);
        let caps = BARE_ROOM.captures(&line)?;
        Some(LineMatch {
            person: None,
            room: Some(room_from_token(&caps["room"])),
        })
    }
}

/// Group names on an instructor page; leftover text is searched for a room.
pub struct GroupTokenMatcher;

impl LineMatcher for GroupTokenMatcher {
    fn name(&self) -> &'static str {
        "group-token"
    }

    fn try_match(&self, line: &str) -> Option<LineMatch> {
        let groups: Vec<&str> = GROUP_TOKEN.find_iter(line).map(|m| m.as_str()).collect();
        if groups.is_empty() {
            return None;
        }
        let rest = GROUP_TOKEN.replace_all(line, " ");
        let room = run_cascade(&room_matchers(), &rest).and_then(|m| m.room);
        Some(LineMatch {
            person: Some(groups.join(", ")),
            room,
        })
    }
}

/// Catch-all: the whole line is the person.
pub struct VerbatimMatcher;

impl LineMatcher for VerbatimMatcher {
    fn name(&self) -> &'static str {
        "verbatim"
    }

    fn try_match(&self, line: &str) -> Option<LineMatch> {
        Some(LineMatch {
            person: non_empty(line),
            room: None,
        })
    }
}

/// Matchers used to recover just a room.
fn room_matchers() -> [&'static dyn LineMatcher; 3] {
    [&StructuredMatcher, &AuditoriumMatcher, &BareRoomMatcher]
}

fn run_cascade(matchers: &[&dyn LineMatcher], line: &str) -> Option<LineMatch> {
    matchers.iter().find_map(|matcher| {
        let found = matcher.try_match(line)?;
        log::trace!("Matcher '{}' accepted {line:?}", matcher.name());
        Some(found)
    })
}

/// Parses cell text for one page variant.
pub struct CellParser {
    variant: PageVariant,
    person_matchers: Vec<&'static dyn LineMatcher>,
}

impl CellParser {
    pub fn new(variant: PageVariant) -> Self {
        let person_matchers: Vec<&'static dyn LineMatcher> = match variant {
            PageVariant::Group => vec![&StructuredMatcher, &AuditoriumMatcher, &VerbatimMatcher],
            PageVariant::Teacher => vec![&GroupTokenMatcher, &AuditoriumMatcher, &VerbatimMatcher],
        };
        Self {
            variant,
            person_matchers,
        }
    }

    pub fn variant(&self) -> PageVariant {
        self.variant
    }

    /// Parse one cell.
    ///
    /// `Ok(None)` for empty or placeholder cells; `Err(MalformedCell)` when
    /// the subject line carries no readable text at all.
    pub fn parse(&self, text: &str) -> Result<Option<CellFragment>> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !EMPTY_CELLS.contains(line))
            .collect();

        let Some(first) = lines.first() else {
            return Ok(None);
        };
        if !first.chars().any(char::is_alphanumeric) {
            return Err(AppError::MalformedCell(format!(
                "no subject text in {first:?}"
            )));
        }

        let (kind, subject) = classify(first);
        let mut fragment = CellFragment {
            subject,
            kind,
            person: None,
            room: None,
        };

        if let Some(second) = lines.get(1) {
            let found = run_cascade(&self.person_matchers, second).unwrap_or_default();
            fragment.person = found.person;
            fragment.room = found.room;
        }

        if fragment.room.is_none() {
            if let Some(third) = lines.get(2) {
                fragment.room = run_cascade(&room_matchers(), third).and_then(|m| m.room);
            }
        }

        Ok(Some(fragment))
    }
}

impl Default for CellParser {
    fn default() -> Self {
        Self::new(PageVariant::default())
    }
}

fn case_insensitive(literal: &str) -> Regex {
    Regex::new(&format!("(?i){}", regex::escape(literal))).expect("valid marker")
}

/// Lesson type and cleaned subject of the first cell line.
///
/// The type comes from the first marker present; independently, the first
/// abbreviation present is stripped from the subject.
fn classify(line: &str) -> (LessonType, Option<String>) {
    let kind = MARKER_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(line))
        .map(|(_, kind)| *kind)
        .unwrap_or_default();

    let subject = match ABBREVIATION_PATTERNS.iter().find(|p| p.is_match(line)) {
        Some(pattern) => pattern.replace(line, " ").into_owned(),
        None => line.to_string(),
    };
    (kind, non_empty(&subject).map(|s| capitalize(&s)))
}

fn room_from_token(token: &str) -> String {
    format!("ауд. {}", WHITESPACE.replace_all(token, " ").to_uppercase())
}

/// Collapse whitespace and trim separators left behind by removals.
fn clean(text: &str) -> String {
    WHITESPACE
        .replace_all(text, " ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'))
        .to_string()
}

fn non_empty(text: &str) -> Option<String> {
    Some(clean(text)).filter(|s| !s.is_empty())
}

/// Uppercase the first grapheme, leave the rest untouched.
fn capitalize(text: &str) -> String {
    let mut graphemes = text.graphemes(true);
    match graphemes.next() {
        Some(first) => first.to_uppercase() + graphemes.as_str(),
        None => String::new(),
    }
}
