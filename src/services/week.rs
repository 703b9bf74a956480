// src/services/week.rs

//! Week detector and page caption reader.
//!
//! The week number lives in styled header text ("Неделя: 5-я"). The styling
//! is the only reliable marker but is missing on some page variants, hence
//! the fallback to a whole-document search and finally to week 1.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ExtractionConfig;

/// Week used when the page does not state one.
pub const DEFAULT_WEEK: u32 = 1;

static WEEK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Неделя:\s*(\d+)\s*-\s*я").expect("valid week pattern"));

static CAPTION_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b, h1, h2, h3, font").expect("valid caption selector"));

static GROUP_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Группа:\s*([^\s,;]+)").expect("valid group caption"));

static TEACHER_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Преподаватель:\s*([^\n,;]+)").expect("valid teacher caption")
});

/// Reads the current week index from page chrome.
#[derive(Debug, Clone)]
pub struct WeekDetector {
    marker: Selector,
}

impl WeekDetector {
    /// Create a detector for header text matching `marker_selector`.
    pub fn new(marker_selector: &str) -> Result<Self> {
        let marker = Selector::parse(marker_selector).map_err(|e| {
            AppError::config(format!("Invalid week marker selector '{marker_selector}': {e:?}"))
        })?;
        Ok(Self { marker })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::new(&config.week_marker_selector)
    }

    /// Week number printed on the page, [`DEFAULT_WEEK`] when absent or
    /// not representable.
    pub fn detect(&self, document: &Html) -> u32 {
        let from_marker = document
            .select(&self.marker)
            .find_map(|node| find_week(&node.text().collect::<String>()));
        if let Some(week) = from_marker {
            return week;
        }

        let whole = document.root_element().text().collect::<Vec<_>>().join(" ");
        find_week(&whole).unwrap_or_else(|| {
            log::debug!("No week marker found, assuming week {DEFAULT_WEEK}");
            DEFAULT_WEEK
        })
    }
}

fn find_week(text: &str) -> Option<u32> {
    WEEK_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Group or instructor name from a "Группа:" / "Преподаватель:" caption.
pub fn detect_caption(document: &Html) -> Option<String> {
    document.select(&CAPTION_ELEMENTS).find_map(|element| {
        let text = element.text().collect::<Vec<_>>().join(" ");
        GROUP_CAPTION
            .captures(&text)
            .or_else(|| TEACHER_CAPTION.captures(&text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> WeekDetector {
        WeekDetector::from_config(&ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_week_from_styled_marker() {
        let doc = Html::parse_document(
            r##"<p>Неделя: 9-я (архив)</p>
                <font color="#ff00ff" face="Times New Roman" size="5">Неделя: 12-я</font>"##,
        );
        assert_eq!(detector().detect(&doc), 12);
    }

    #[test]
    fn test_week_from_document_text() {
        let doc = Html::parse_document("<div><span>Неделя: 3-я</span></div>");
        assert_eq!(detector().detect(&doc), 3);
    }

    #[test]
    fn test_week_defaults_to_one() {
        let doc = Html::parse_document("<div>Расписание</div>");
        assert_eq!(detector().detect(&doc), DEFAULT_WEEK);
    }

    #[test]
    fn test_unrepresentable_week_falls_back() {
        let doc = Html::parse_document("<p>Неделя: 99999999999-я</p>");
        assert_eq!(detector().detect(&doc), DEFAULT_WEEK);
    }

    #[test]
    fn test_invalid_marker_selector() {
        assert!(WeekDetector::new("font[").is_err());
    }

    #[test]
    fn test_group_caption() {
        let doc = Html::parse_document("<b>Группа: ИВТИИбд-32</b>");
        assert_eq!(detect_caption(&doc).as_deref(), Some("ИВТИИбд-32"));
    }

    #[test]
    fn test_teacher_caption() {
        let doc = Html::parse_document("<h2>Преподаватель: Иванов Иван Иванович</h2>");
        assert_eq!(
            detect_caption(&doc).as_deref(),
            Some("Иванов Иван Иванович")
        );
    }

    #[test]
    fn test_no_caption() {
        let doc = Html::parse_document("<b>Расписание занятий</b>");
        assert_eq!(detect_caption(&doc), None);
    }
}
