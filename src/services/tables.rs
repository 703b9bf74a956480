// src/services/tables.rs

//! Table extractor.
//!
//! Finds candidate timetable tables in a page and flattens each into a grid
//! of cell texts. Strategies run in the configured order and the first one
//! producing a non-empty grid wins.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{ExtractionConfig, TableStrategy};

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));

/// Class names that mark a table as a data table.
static TABLE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)table|schedule|timetable|raspis|расписан").expect("valid class pattern")
});

/// Weekday abbreviations and the pair keyword, used for content sniffing.
const CONTENT_MARKERS: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "пара"];

/// One table flattened to rows of cell text.
///
/// Cell text keeps one line per text node, trimmed, blank nodes dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a grid from literal rows.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    fn from_table(table: ElementRef<'_>) -> Self {
        let rows = table
            .select(&ROW)
            .filter(|row| belongs_to(*row, table))
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(cell_text)
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();
        Self { rows }
    }
}

/// Locates timetable grids with a layered fallback search.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    strategies: Vec<TableStrategy>,
}

impl TableExtractor {
    pub fn new(strategies: Vec<TableStrategy>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.table_strategies.clone())
    }

    /// Candidate grids from the first strategy that finds any.
    ///
    /// Returns an empty list when no strategy matches; never fails.
    pub fn extract(&self, document: &Html) -> Vec<Grid> {
        let tables: Vec<ElementRef<'_>> = document.select(&TABLE).collect();

        for strategy in &self.strategies {
            let grids: Vec<Grid> = tables
                .iter()
                .filter(|table| matches_strategy(*strategy, **table))
                .map(|table| Grid::from_table(*table))
                .filter(|grid| !grid.is_empty())
                .collect();

            if !grids.is_empty() {
                log::debug!("Table strategy {strategy:?} found {} grid(s)", grids.len());
                return grids;
            }
        }

        log::debug!("No timetable table found among {} table(s)", tables.len());
        Vec::new()
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

fn matches_strategy(strategy: TableStrategy, table: ElementRef<'_>) -> bool {
    let element = table.value();
    match strategy {
        TableStrategy::Bordered => element
            .attr("border")
            .is_some_and(|b| !matches!(b.trim(), "" | "0")),
        TableStrategy::Classed => element
            .attr("class")
            .is_some_and(|class| TABLE_CLASS.is_match(class)),
        TableStrategy::Any => true,
        TableStrategy::Content => {
            let text = table.text().collect::<String>().to_lowercase();
            CONTENT_MARKERS.iter().any(|marker| text.contains(marker))
        }
    }
}

/// Whether `table` is the nearest enclosing table of `row`.
fn belongs_to(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
        .is_some_and(|owner| owner.id() == table.id())
}

/// Cell text with one trimmed line per text node.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<Grid> {
        TableExtractor::default().extract(&Html::parse_document(html))
    }

    #[test]
    fn test_bordered_table_preferred() {
        let grids = extract(
            r#"<table><tr><td>layout</td></tr></table>
               <table border="1"><tr><td>Пн</td><td>Матем.<br>Иванов</td></tr></table>"#,
        );
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows, vec![vec!["Пн", "Матем.\nИванов"]]);
    }

    #[test]
    fn test_border_zero_is_not_a_data_table() {
        let grids = extract(
            r#"<table border="0"><tr><td>a</td></tr></table>
               <table class="schedule-grid"><tr><td>b</td></tr></table>"#,
        );
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows[0][0], "b");
    }

    #[test]
    fn test_falls_back_to_any_table() {
        let grids = extract("<table><tr><td>x</td></tr></table><table><tr><td>y</td></tr></table>");
        assert_eq!(grids.len(), 2);
    }

    #[test]
    fn test_content_sniffing_strategy() {
        let extractor = TableExtractor::new(vec![TableStrategy::Content]);
        let doc = Html::parse_document(
            "<table><tr><td>menu</td></tr></table><table><tr><td>1-я пара</td></tr></table>",
        );
        let grids = extractor.extract(&doc);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows[0][0], "1-я пара");
    }

    #[test]
    fn test_nested_rows_stay_with_their_table() {
        let grids = extract(
            r#"<table border="1"><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>"#,
        );
        assert_eq!(grids[0].rows.len(), 1);
        assert_eq!(grids[0].rows[0], vec!["outer\ninner"]);
    }

    #[test]
    fn test_no_table_yields_nothing() {
        assert!(extract("<html><body><p>Расписание недоступно</p></body></html>").is_empty());
    }
}
