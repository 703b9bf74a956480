//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{IdentityEntry, SchedulePart};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal endpoints and HTTP behavior
    #[serde(default)]
    pub portal: PortalConfig,

    /// Login credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Table and cell extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Group number space, schedule parts and group names
    #[serde(default)]
    pub groups: GroupsConfig,

    /// Instructor number space and names
    #[serde(default)]
    pub teachers: TeachersConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::validation("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if encoding_rs::Encoding::for_label(self.portal.encoding.as_bytes()).is_none() {
            return Err(AppError::validation(format!(
                "portal.encoding '{}' is not a known encoding label",
                self.portal.encoding
            )));
        }
        if self.extraction.max_pairs == 0 {
            return Err(AppError::validation("extraction.max_pairs must be > 0"));
        }
        if self.extraction.table_strategies.is_empty() {
            return Err(AppError::validation("No table strategies defined"));
        }
        self.groups.validate()?;
        self.teachers.validate()?;
        Ok(())
    }
}

/// Portal endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Site root, used to build the login URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Login endpoint path relative to `base_url`
    #[serde(default = "defaults::login_path")]
    pub login_path: String,

    /// Phrase in the login response that signals rejected credentials
    #[serde(default = "defaults::failure_phrase")]
    pub failure_phrase: String,

    /// Encoding label forced onto every fetched page
    #[serde(default = "defaults::encoding")]
    pub encoding: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches in a bulk run, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Refuse to fetch pages before a successful login
    #[serde(default = "defaults::require_auth")]
    pub require_auth: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            login_path: defaults::login_path(),
            failure_phrase: defaults::failure_phrase(),
            encoding: defaults::encoding(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            require_auth: defaults::require_auth(),
        }
    }
}

impl PortalConfig {
    /// Absolute URL of the login form.
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        )
    }
}

/// Portal credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl AuthConfig {
    pub fn is_empty(&self) -> bool {
        self.login.is_empty() || self.password.is_empty()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Strategy used to locate timetable tables in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStrategy {
    /// Tables with a non-zero `border` attribute
    Bordered,
    /// Tables whose class looks like a table/schedule class
    Classed,
    /// Every table in the page
    Any,
    /// Tables whose text mentions a weekday or "пара"
    Content,
}

/// Table and cell extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Rows at the top of the grid that carry headers, not days
    #[serde(default = "defaults::header_rows")]
    pub header_rows: usize,

    /// Number of pair columns after the day label column
    #[serde(default = "defaults::max_pairs")]
    pub max_pairs: usize,

    /// Table search strategies, tried in order
    #[serde(default = "defaults::table_strategies")]
    pub table_strategies: Vec<TableStrategy>,

    /// CSS selector for the styled header text carrying the week number
    #[serde(default = "defaults::week_marker_selector")]
    pub week_marker_selector: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_rows: defaults::header_rows(),
            max_pairs: defaults::max_pairs(),
            table_strategies: defaults::table_strategies(),
            week_marker_selector: defaults::week_marker_selector(),
        }
    }
}

/// Group number space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Smallest valid group number
    #[serde(default = "defaults::group_min")]
    pub min: u32,

    /// Largest valid group number
    #[serde(default = "defaults::group_max")]
    pub max: u32,

    /// Part serving numbers that no part range covers
    #[serde(default = "defaults::default_part")]
    pub default_part: u32,

    /// Schedule parts, scanned in order
    #[serde(default = "defaults::parts")]
    pub parts: Vec<SchedulePart>,

    /// Known group names
    #[serde(default)]
    pub entries: Vec<IdentityEntry>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            min: defaults::group_min(),
            max: defaults::group_max(),
            default_part: defaults::default_part(),
            parts: defaults::parts(),
            entries: Vec::new(),
        }
    }
}

impl GroupsConfig {
    fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(AppError::validation("groups.min must be <= groups.max"));
        }
        if self.parts.is_empty() {
            return Err(AppError::validation("No schedule parts defined"));
        }
        if !self.parts.iter().any(|p| p.id == self.default_part) {
            return Err(AppError::validation(format!(
                "groups.default_part {} does not name a schedule part",
                self.default_part
            )));
        }

        for (i, part) in self.parts.iter().enumerate() {
            if part.range_start > part.range_end {
                return Err(AppError::validation(format!(
                    "Part {} has an empty range",
                    part.id
                )));
            }
            if part.range_start < self.min || part.range_end > self.max {
                return Err(AppError::validation(format!(
                    "Part {} range [{}, {}] falls outside [{}, {}]",
                    part.id, part.range_start, part.range_end, self.min, self.max
                )));
            }
            check_template(&part.url_template, &format!("part {}", part.id))?;
            if let Some(other) = self.parts[i + 1..].iter().find(|o| o.overlaps(part)) {
                return Err(AppError::validation(format!(
                    "Parts {} and {} overlap",
                    part.id, other.id
                )));
            }
        }

        let covered: u64 = self
            .parts
            .iter()
            .map(|p| u64::from(p.range_end - p.range_start) + 1)
            .sum();
        let total = u64::from(self.max - self.min) + 1;
        if covered < total {
            log::warn!(
                "Schedule parts cover {covered} of {total} group numbers; part {} serves the rest",
                self.default_part
            );
        }

        check_entries(&self.entries, self.min, self.max, "group")
    }
}

/// Instructor number space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachersConfig {
    /// Smallest valid instructor number
    #[serde(default = "defaults::teacher_min")]
    pub min: u32,

    /// Largest valid instructor number
    #[serde(default = "defaults::teacher_max")]
    pub max: u32,

    /// URL template with a single `{}` placeholder for the instructor number
    #[serde(default = "defaults::teacher_url_template")]
    pub url_template: String,

    /// Known instructor full names
    #[serde(default)]
    pub entries: Vec<IdentityEntry>,
}

impl Default for TeachersConfig {
    fn default() -> Self {
        Self {
            min: defaults::teacher_min(),
            max: defaults::teacher_max(),
            url_template: defaults::teacher_url_template(),
            entries: Vec::new(),
        }
    }
}

impl TeachersConfig {
    fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(AppError::validation("teachers.min must be <= teachers.max"));
        }
        check_template(&self.url_template, "teachers")?;
        check_entries(&self.entries, self.min, self.max, "teacher")
    }
}

fn check_template(template: &str, owner: &str) -> Result<()> {
    if template.matches("{}").count() != 1 {
        return Err(AppError::validation(format!(
            "URL template of {owner} must contain exactly one '{{}}'"
        )));
    }
    Ok(())
}

fn check_entries(entries: &[IdentityEntry], min: u32, max: u32, kind: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !(min..=max).contains(&entry.number) {
            return Err(AppError::validation(format!(
                "{kind} '{}' has number {} outside [{min}, {max}]",
                entry.name, entry.number
            )));
        }
        if !seen.insert(entry.number) {
            return Err(AppError::validation(format!(
                "Duplicate {kind} number {}",
                entry.number
            )));
        }
    }
    Ok(())
}

mod defaults {
    use super::TableStrategy;
    use crate::models::SchedulePart;

    // Portal defaults
    pub fn base_url() -> String {
        "https://lk.ulstu.ru".into()
    }
    pub fn login_path() -> String {
        "/?q=auth/login".into()
    }
    pub fn failure_phrase() -> String {
        "Неверный логин или пароль".into()
    }
    pub fn encoding() -> String {
        "windows-1251".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; timetable/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn require_auth() -> bool {
        true
    }
    pub fn log_level() -> String {
        "info".into()
    }

    // Extraction defaults
    pub fn header_rows() -> usize {
        2
    }
    pub fn max_pairs() -> usize {
        8
    }
    pub fn table_strategies() -> Vec<TableStrategy> {
        vec![
            TableStrategy::Bordered,
            TableStrategy::Classed,
            TableStrategy::Any,
            TableStrategy::Content,
        ]
    }
    pub fn week_marker_selector() -> String {
        r##"font[color="#ff00ff"][face="Times New Roman"][size="5"]"##.into()
    }

    // Identity defaults
    pub fn group_min() -> u32 {
        1
    }
    pub fn group_max() -> u32 {
        234
    }
    pub fn default_part() -> u32 {
        1
    }
    pub fn teacher_min() -> u32 {
        1
    }
    pub fn teacher_max() -> u32 {
        2000
    }
    pub fn teacher_url_template() -> String {
        "https://lk.ulstu.ru/timetable/shared/teachers/m{}.html".into()
    }

    pub fn parts() -> Vec<SchedulePart> {
        vec![
            SchedulePart {
                id: 1,
                display_name: "Часть 1 - МФ, РТФ, ЭФ, ИФМИ".into(),
                range_start: 1,
                range_end: 115,
                url_template: "https://lk.ulstu.ru/timetable/shared/schedule/Часть%201%20-%20МФ,%20РТФ,%20ЭФ%20(очная,%20очно-заочная%20формы%20обучения),%20ИФМИ,%20группы%20исскуственного%20интелекта%20(магистр)/{}.html".into(),
            },
            SchedulePart {
                id: 2,
                display_name: "Часть 2 - ФИСТ, ГФ".into(),
                range_start: 116,
                range_end: 234,
                url_template: "https://lk.ulstu.ru/timetable/shared/schedule/Часть%202%20–%20ФИСТ,%20ГФ/{}.html".into(),
            },
        ]
    }
}
