// src/pipeline/bulk.rs

//! Bulk extraction over every group number.
//!
//! Pages are fetched one at a time with a fixed pause between requests.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::ExtractionResult;
use crate::pipeline::extract::Extractor;
use crate::services::PageSource;
use crate::utils::log::{header, step, sub_item, summary};

/// Timetable of one group in a bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct GroupTimetable {
    pub number: u32,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// Outcome of a bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub groups: Vec<GroupTimetable>,
}

impl BulkReport {
    /// Groups whose page produced at least one lesson.
    pub fn populated_count(&self) -> usize {
        self.groups.iter().filter(|g| !g.result.is_empty()).count()
    }

    pub fn lesson_count(&self) -> usize {
        self.groups.iter().map(|g| g.result.lessons.len()).sum()
    }
}

/// Extract the timetable of every group in the configured range.
pub async fn run_bulk(
    extractor: &Extractor,
    source: &dyn PageSource,
    delay: Duration,
) -> Result<BulkReport> {
    let start_time = Utc::now();
    let range = extractor.locator().group_range();
    let total = range.clone().count();
    header(&format!("Extracting {total} group timetables"));
    sub_item(&format!("Delay between requests: {}ms", delay.as_millis()));

    let mut groups = Vec::with_capacity(total);
    for (index, number) in range.enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = extractor.extract_group(source, number).await?;
        step(
            index + 1,
            total,
            &format!("{}: {} lesson(s)", result.resolved_name, result.lessons.len()),
        );
        groups.push(GroupTimetable { number, result });
    }

    let report = BulkReport {
        start_time,
        end_time: Utc::now(),
        groups,
    };

    let elapsed = report.end_time - report.start_time;
    summary(
        "Bulk extraction",
        &[
            ("Groups", report.groups.len().to_string()),
            ("With lessons", report.populated_count().to_string()),
            ("Lessons", report.lesson_count().to_string()),
            ("Elapsed", format!("{}s", elapsed.num_seconds())),
        ],
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::pipeline::extract::tests::{FixtureSource, GROUP_PAGE};

    fn small_config() -> Config {
        let mut config = Config::default();
        config.groups.max = 3;
        config.groups.parts.truncate(1);
        config.groups.parts[0].range_end = 3;
        config
    }

    #[tokio::test]
    async fn test_bulk_visits_every_group_in_order() {
        let extractor = Extractor::new(&small_config()).unwrap();
        let url = extractor.locator().url_for_group_number(2).unwrap();
        let source = FixtureSource::default().with(&url, GROUP_PAGE);

        let report = run_bulk(&extractor, &source, Duration::ZERO).await.unwrap();

        let numbers: Vec<u32> = report.groups.iter().map(|g| g.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(report.populated_count(), 1);
        assert_eq!(report.lesson_count(), 2);
        assert_eq!(report.groups[0].result.resolved_name, "Группа_1");
        assert!(report.end_time >= report.start_time);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_waits_between_requests() {
        let extractor = Extractor::new(&small_config()).unwrap();
        let before = tokio::time::Instant::now();

        run_bulk(&extractor, &FixtureSource::default(), Duration::from_secs(1))
            .await
            .unwrap();

        assert!(before.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = BulkReport {
            start_time: Utc::now(),
            end_time: Utc::now(),
            groups: vec![GroupTimetable {
                number: 7,
                result: ExtractionResult::empty("ПИбд-11"),
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["groups"][0]["number"], 7);
        assert_eq!(json["groups"][0]["resolved_name"], "ПИбд-11");
    }
}
