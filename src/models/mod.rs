// src/models/mod.rs

//! Domain models for the timetable extractor.
//!
//! Plain data shared by the services: configuration, identities and the
//! lesson records produced from a page.

mod config;
mod identity;
mod lesson;

// Re-export all public types
pub use config::{
    AuthConfig, Config, ExtractionConfig, GroupsConfig, LoggingConfig, PortalConfig,
    TableStrategy, TeachersConfig,
};
pub use identity::{Identity, IdentityEntry, IdentityKind, SchedulePart};
pub use lesson::{
    Day, ExtractionResult, LessonRecord, LessonType, UNKNOWN_PERSON, UNKNOWN_ROOM,
    UNKNOWN_SUBJECT,
};
