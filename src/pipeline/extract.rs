// src/pipeline/extract.rs

//! Single-page extraction pipeline.
//!
//! Locator resolves the identity to a URL, the page source fetches it, and
//! the parsed document runs through table extraction, week detection and
//! assembly. Fetch failures degrade to an empty result carrying the name
//! of the identity that was attempted.

use scraper::Html;

use crate::error::Result;
use crate::models::{Config, ExtractionResult, Identity, IdentityKind};
use crate::services::{
    Locator, PageSource, PageVariant, ScheduleAssembler, TableExtractor, WeekDetector,
    detect_caption,
};

/// Extraction components wired from one configuration.
#[derive(Debug, Clone)]
pub struct Extractor {
    locator: Locator,
    tables: TableExtractor,
    week: WeekDetector,
    assembler: ScheduleAssembler,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            locator: Locator::from_config(config),
            tables: TableExtractor::from_config(&config.extraction),
            week: WeekDetector::from_config(&config.extraction)?,
            assembler: ScheduleAssembler::from_config(&config.extraction),
        })
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Extract lessons from already fetched page text.
    ///
    /// The page caption, when present, names the result; otherwise
    /// `fallback_name` does.
    pub fn extract_page(
        &self,
        html: &str,
        variant: PageVariant,
        fallback_name: &str,
    ) -> ExtractionResult {
        let document = Html::parse_document(html);
        let week = self.week.detect(&document);
        let grids = self.tables.extract(&document);
        let lessons = self.assembler.assemble(&grids, week, variant);

        ExtractionResult {
            resolved_name: detect_caption(&document).unwrap_or_else(|| fallback_name.to_string()),
            week: week.to_string(),
            lessons,
        }
    }

    /// Timetable of a group by global number.
    pub async fn extract_group(
        &self,
        source: &dyn PageSource,
        number: u32,
    ) -> Result<ExtractionResult> {
        let url = self.locator.url_for_group_number(number)?;
        let name = self.locator.name_for_group_number(number);
        self.fetch_and_extract(source, &url, PageVariant::Group, &name)
            .await
    }

    /// Timetable of an instructor by number.
    pub async fn extract_teacher(
        &self,
        source: &dyn PageSource,
        number: u32,
    ) -> Result<ExtractionResult> {
        let url = self.locator.url_for_teacher_number(number)?;
        let name = self.locator.name_for_teacher_number(number);
        self.fetch_and_extract(source, &url, PageVariant::Teacher, &name)
            .await
    }

    /// Timetable of a resolved identity of either kind.
    pub async fn extract_identity(
        &self,
        source: &dyn PageSource,
        identity: &Identity,
    ) -> Result<ExtractionResult> {
        let url = self.locator.url_for(identity)?;
        self.fetch_and_extract(source, &url, variant_for(identity.kind), &identity.display_name)
            .await
    }

    /// Timetable behind a ready-made URL.
    ///
    /// The identity is recovered from the URL so that a failed fetch still
    /// reports which group or instructor was attempted.
    pub async fn extract_url(&self, source: &dyn PageSource, url: &str) -> Result<ExtractionResult> {
        let (variant, name) = match self.locator.identity_for_url(url) {
            Some(identity) => (variant_for(identity.kind), identity.display_name),
            None => {
                log::debug!("URL {url} matches no known template");
                (PageVariant::Group, url.to_string())
            }
        };
        self.fetch_and_extract(source, url, variant, &name).await
    }

    async fn fetch_and_extract(
        &self,
        source: &dyn PageSource,
        url: &str,
        variant: PageVariant,
        name: &str,
    ) -> Result<ExtractionResult> {
        let html = match source.fetch(url).await {
            Ok(html) => html,
            Err(e) if e.is_fetch_failure() => {
                log::warn!("Could not fetch timetable for {name}: {e}");
                return Ok(ExtractionResult::empty(name));
            }
            Err(e) => return Err(e),
        };

        let result = self.extract_page(&html, variant, name);
        log::debug!(
            "{}: week {}, {} lesson(s)",
            result.resolved_name,
            result.week,
            result.lessons.len()
        );
        Ok(result)
    }
}

fn variant_for(kind: IdentityKind) -> PageVariant {
    match kind {
        IdentityKind::Group => PageVariant::Group,
        IdentityKind::Teacher => PageVariant::Teacher,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Day, IdentityEntry, LessonType};

    /// In-memory page source keyed by URL.
    #[derive(Default)]
    pub(crate) struct FixtureSource {
        pub pages: HashMap<String, String>,
    }

    impl FixtureSource {
        pub fn with(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageSource for FixtureSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, "404 Not Found"))
        }
    }

    pub(crate) const GROUP_PAGE: &str = r##"
        <html><body>
        <font color="#ff00ff" face="Times New Roman" size="5">Неделя: 7-я</font>
        <b>Группа: ИВТИИбд-32</b>
        <table border="1">
          <tr><td></td><td>1-я</td><td>2-я</td></tr>
          <tr><td></td><td>08:30-09:50</td><td>10:00-11:20</td></tr>
          <tr><td>Пн</td><td>Пр. Базы данных<br>Кузнецов К К 3-410</td><td>-</td></tr>
          <tr><td>Вт</td><td></td><td>Лекция<br>Иванов И.И. ауд. 101</td></tr>
        </table>
        </body></html>"##;

    fn config() -> Config {
        let mut config = Config::default();
        config.groups.entries = vec![IdentityEntry {
            number: 5,
            name: "ИВТИИбд-32".into(),
        }];
        config.teachers.entries = vec![IdentityEntry {
            number: 12,
            name: "Кузнецов Кирилл Константинович".into(),
        }];
        config
    }

    #[test]
    fn test_extract_page() {
        let extractor = Extractor::new(&config()).unwrap();
        let result = extractor.extract_page(GROUP_PAGE, PageVariant::Group, "fallback");

        assert_eq!(result.resolved_name, "ИВТИИбд-32");
        assert_eq!(result.week, "7");
        assert_eq!(result.lessons.len(), 2);

        let first = &result.lessons[0];
        assert_eq!((first.day, first.pair, first.week), (Day::Mon, 1, 7));
        assert_eq!(first.kind, LessonType::Practice);
        assert_eq!(first.subject, "Базы данных");
        assert_eq!(first.person, "Кузнецов К К");
        assert_eq!(first.room, "ауд. 3-410");

        let second = &result.lessons[1];
        assert_eq!((second.day, second.pair), (Day::Tue, 2));
        assert_eq!(second.room, "ауд. 101");
    }

    #[test]
    fn test_page_without_table() {
        let extractor = Extractor::new(&config()).unwrap();
        let result = extractor.extract_page("<p>Нет данных</p>", PageVariant::Group, "ПИбд-11");
        assert_eq!(result.resolved_name, "ПИбд-11");
        assert_eq!(result.week, "1");
        assert!(result.is_empty());
    }

    #[test]
    fn test_result_week_matches_lesson_week() {
        let extractor = Extractor::new(&config()).unwrap();
        let page = GROUP_PAGE.replace("Неделя: 7-я", "Неделя: 99999999999-я");
        let result = extractor.extract_page(&page, PageVariant::Group, "fallback");

        assert_eq!(result.week, "1");
        assert!(!result.lessons.is_empty());
        assert!(result.lessons.iter().all(|l| l.week.to_string() == result.week));
    }

    #[tokio::test]
    async fn test_extract_group_by_number() {
        let extractor = Extractor::new(&config()).unwrap();
        let url = extractor.locator().url_for_group_number(5).unwrap();
        let source = FixtureSource::default().with(&url, GROUP_PAGE);

        let result = extractor.extract_group(&source, 5).await.unwrap();
        assert_eq!(result.lessons.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_empty() {
        let extractor = Extractor::new(&config()).unwrap();
        let source = FixtureSource::default();

        let result = extractor.extract_group(&source, 5).await.unwrap();
        assert_eq!(result, ExtractionResult::empty("ИВТИИбд-32"));

        let result = extractor.extract_teacher(&source, 40).await.unwrap();
        assert_eq!(result.resolved_name, "Преподаватель_40");
    }

    #[tokio::test]
    async fn test_out_of_range_propagates() {
        let extractor = Extractor::new(&config()).unwrap();
        let result = extractor.extract_group(&FixtureSource::default(), 9999).await;
        assert!(matches!(result, Err(AppError::OutOfRange { number: 9999, .. })));
    }

    #[tokio::test]
    async fn test_extract_url_recovers_identity() {
        let extractor = Extractor::new(&config()).unwrap();
        let url = extractor.locator().url_for_group_number(5).unwrap();

        let result = extractor
            .extract_url(&FixtureSource::default(), &url)
            .await
            .unwrap();
        assert_eq!(result.resolved_name, "ИВТИИбд-32");
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_extract_teacher_page() {
        let extractor = Extractor::new(&config()).unwrap();
        let identity = extractor.locator().find_teacher("кузнецов").unwrap();
        let url = extractor.locator().url_for(&identity).unwrap();
        let page = r#"<table border="1">
            <tr><td></td></tr><tr><td></td></tr>
            <tr><td>Пн</td><td>Пр. Базы данных<br>ИВТИИбд-32 3-410</td></tr>
        </table>"#;
        let source = FixtureSource::default().with(&url, page);

        let result = extractor.extract_identity(&source, &identity).await.unwrap();
        assert_eq!(result.resolved_name, "Кузнецов Кирилл Константинович");
        assert_eq!(result.lessons[0].person, "ИВТИИбд-32");
    }
}
