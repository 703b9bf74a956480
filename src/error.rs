// src/error.rs

//! Unified error handling for the timetable extractor.

use std::fmt;

use thiserror::Error;

use crate::models::IdentityKind;

/// Result type alias for timetable operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The portal refused the supplied credentials
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// A fetch was attempted on a session that never logged in
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// Non-2xx status or transport failure while fetching a page
    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Identity number outside the configured bounds
    #[error("{kind} number {number} is out of range [{min}, {max}]")]
    OutOfRange {
        kind: IdentityKind,
        number: u32,
        min: u32,
        max: u32,
    },

    /// Name lookup found nothing usable
    #[error("Nothing found for '{query}'")]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    /// A single table cell could not be parsed
    #[error("Malformed cell: {0}")]
    MalformedCell(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with the URL that failed.
    pub fn fetch(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a not-found error carrying near matches for the caller.
    pub fn not_found(query: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::NotFound {
            query: query.into(),
            suggestions,
        }
    }

    /// Whether the error means "the page could not be obtained".
    ///
    /// The extraction pipeline degrades these to an empty result instead of
    /// propagating them.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::Http(_) | Self::NotAuthenticated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_bounds() {
        let err = AppError::OutOfRange {
            kind: IdentityKind::Group,
            number: 9999,
            min: 1,
            max: 234,
        };
        assert_eq!(
            err.to_string(),
            "group number 9999 is out of range [1, 234]"
        );
    }

    #[test]
    fn fetch_failures_are_recoverable() {
        assert!(AppError::fetch("https://example.com", "404").is_fetch_failure());
        assert!(AppError::NotAuthenticated.is_fetch_failure());
        assert!(!AppError::validation("bad").is_fetch_failure());
    }
}
