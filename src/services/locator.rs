// src/services/locator.rs

//! Identity locator.
//!
//! Maps group and instructor identities (number or free-form name) to the
//! URLs that serve their timetables, and back. Group pages are split over
//! several schedule parts, each numbering its groups from 1.

use std::ops::RangeInclusive;

use crate::error::{AppError, Result};
use crate::models::{
    Config, GroupsConfig, Identity, IdentityEntry, IdentityKind, SchedulePart, TeachersConfig,
};
use crate::utils::url::{fill_template, match_template};

/// Maximum number of near matches offered on a failed lookup.
const MAX_SUGGESTIONS: usize = 5;

/// A group URL resolved back to its schedule part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartMatch<'a> {
    pub part: &'a SchedulePart,
    /// Number embedded in the URL
    pub local_number: u32,
    /// Global group number
    pub group_number: u32,
}

/// Bidirectional lookup between identities and timetable URLs.
#[derive(Debug, Clone)]
pub struct Locator {
    groups: GroupsConfig,
    teachers: TeachersConfig,
}

impl Locator {
    pub fn new(groups: GroupsConfig, teachers: TeachersConfig) -> Self {
        Self { groups, teachers }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.groups.clone(), config.teachers.clone())
    }

    /// Valid global group numbers.
    pub fn group_range(&self) -> RangeInclusive<u32> {
        self.groups.min..=self.groups.max
    }

    /// Valid instructor numbers.
    pub fn teacher_range(&self) -> RangeInclusive<u32> {
        self.teachers.min..=self.teachers.max
    }

    // --- Groups ---

    /// Schedule part serving the group number.
    ///
    /// Parts are scanned in configuration order; the first containing part
    /// wins and the default part serves numbers no part covers.
    pub fn part_for_group_number(&self, number: u32) -> Result<&SchedulePart> {
        self.check_range(IdentityKind::Group, number)?;
        self.groups
            .parts
            .iter()
            .find(|part| part.contains(number))
            .or_else(|| {
                self.groups
                    .parts
                    .iter()
                    .find(|part| part.id == self.groups.default_part)
            })
            .ok_or_else(|| AppError::config(format!("No schedule part serves group {number}")))
    }

    /// Page URL of the group's timetable.
    pub fn url_for_group_number(&self, number: u32) -> Result<String> {
        let part = self.part_for_group_number(number)?;
        Ok(fill_template(&part.url_template, part.local_number(number)))
    }

    /// Display name of the group, or a synthesized placeholder when unknown.
    pub fn name_for_group_number(&self, number: u32) -> String {
        lookup_name(&self.groups.entries, number).unwrap_or_else(|| format!("Группа_{number}"))
    }

    /// Group number for a free-form name.
    ///
    /// Exact case-insensitive match first, then the first name containing
    /// the query.
    pub fn group_number_for_name(&self, name: &str) -> Option<u32> {
        let query = fold(name);
        if query.is_empty() {
            return None;
        }
        self.groups
            .entries
            .iter()
            .find(|entry| fold(&entry.name) == query)
            .or_else(|| {
                self.groups
                    .entries
                    .iter()
                    .find(|entry| fold(&entry.name).contains(&query))
            })
            .map(|entry| entry.number)
    }

    /// All groups whose name contains the query, in table order.
    pub fn search_groups(&self, query: &str, limit: usize) -> Vec<&IdentityEntry> {
        search(&self.groups.entries, query, limit)
    }

    /// Resolve a user-supplied group number or name.
    pub fn find_group(&self, query: &str) -> Result<Identity> {
        let number = match query.trim().parse::<u32>() {
            Ok(number) => {
                self.check_range(IdentityKind::Group, number)?;
                number
            }
            Err(_) => self
                .group_number_for_name(query)
                .ok_or_else(|| AppError::not_found(query, suggest(&self.groups.entries, query)))?,
        };
        Ok(Identity {
            kind: IdentityKind::Group,
            number,
            display_name: self.name_for_group_number(number),
        })
    }

    /// Resolve an already-built group URL back to its part and number.
    ///
    /// Only URLs this locator would build are accepted: the recovered number
    /// must be in range and served by the part whose template matched.
    pub fn part_for_url(&self, url: &str) -> Option<PartMatch<'_>> {
        self.groups.parts.iter().find_map(|part| {
            let local_number = match_template(&part.url_template, url).filter(|n| *n > 0)?;
            let group_number = part.global_number(local_number)?;
            let owner = self.part_for_group_number(group_number).ok()?;
            (owner.id == part.id).then_some(PartMatch {
                part,
                local_number,
                group_number,
            })
        })
    }

    /// Global group number encoded in a group URL.
    pub fn group_number_for_url(&self, url: &str) -> Option<u32> {
        self.part_for_url(url).map(|m| m.group_number)
    }

    // --- Teachers ---

    /// Page URL of the instructor's timetable.
    pub fn url_for_teacher_number(&self, number: u32) -> Result<String> {
        self.check_range(IdentityKind::Teacher, number)?;
        Ok(fill_template(&self.teachers.url_template, number))
    }

    /// Full name of the instructor, or a synthesized placeholder when unknown.
    pub fn name_for_teacher_number(&self, number: u32) -> String {
        lookup_name(&self.teachers.entries, number)
            .unwrap_or_else(|| format!("Преподаватель_{number}"))
    }

    /// Instructor number for a surname.
    ///
    /// Matches the first token of each stored full name case-insensitively,
    /// then falls back to the first full name containing the query.
    pub fn teacher_number_for_name(&self, name: &str) -> Option<u32> {
        let query = fold(name);
        if query.is_empty() {
            return None;
        }
        self.teachers
            .entries
            .iter()
            .find(|entry| surname(&entry.name).is_some_and(|s| fold(s) == query))
            .or_else(|| {
                self.teachers
                    .entries
                    .iter()
                    .find(|entry| fold(&entry.name).contains(&query))
            })
            .map(|entry| entry.number)
    }

    /// All instructors whose full name contains the query, in table order.
    pub fn search_teachers(&self, query: &str, limit: usize) -> Vec<&IdentityEntry> {
        search(&self.teachers.entries, query, limit)
    }

    /// Resolve a user-supplied instructor number or surname.
    pub fn find_teacher(&self, query: &str) -> Result<Identity> {
        let number = match query.trim().parse::<u32>() {
            Ok(number) => {
                self.check_range(IdentityKind::Teacher, number)?;
                number
            }
            Err(_) => self.teacher_number_for_name(query).ok_or_else(|| {
                AppError::not_found(query, suggest(&self.teachers.entries, query))
            })?,
        };
        Ok(Identity {
            kind: IdentityKind::Teacher,
            number,
            display_name: self.name_for_teacher_number(number),
        })
    }

    /// Instructor number encoded in an instructor URL.
    pub fn teacher_number_for_url(&self, url: &str) -> Option<u32> {
        match_template(&self.teachers.url_template, url)
            .filter(|number| self.teacher_range().contains(number))
    }

    // --- Shared ---

    /// Identity behind any timetable URL this locator can build.
    pub fn identity_for_url(&self, url: &str) -> Option<Identity> {
        if let Some(number) = self.group_number_for_url(url) {
            return Some(Identity {
                kind: IdentityKind::Group,
                number,
                display_name: self.name_for_group_number(number),
            });
        }
        self.teacher_number_for_url(url).map(|number| Identity {
            kind: IdentityKind::Teacher,
            number,
            display_name: self.name_for_teacher_number(number),
        })
    }

    /// Page URL for an identity of either kind.
    pub fn url_for(&self, identity: &Identity) -> Result<String> {
        match identity.kind {
            IdentityKind::Group => self.url_for_group_number(identity.number),
            IdentityKind::Teacher => self.url_for_teacher_number(identity.number),
        }
    }

    fn check_range(&self, kind: IdentityKind, number: u32) -> Result<()> {
        let range = match kind {
            IdentityKind::Group => self.group_range(),
            IdentityKind::Teacher => self.teacher_range(),
        };
        if range.contains(&number) {
            Ok(())
        } else {
            Err(AppError::OutOfRange {
                kind,
                number,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

fn surname(full_name: &str) -> Option<&str> {
    full_name.split_whitespace().next()
}

fn lookup_name(entries: &[IdentityEntry], number: u32) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.number == number)
        .map(|entry| entry.name.clone())
}

fn search<'a>(
    entries: &'a [IdentityEntry],
    query: &str,
    limit: usize,
) -> Vec<&'a IdentityEntry> {
    let query = fold(query);
    if query.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|entry| fold(&entry.name).contains(&query))
        .take(limit)
        .collect()
}

/// Names sharing the query's alphabetic stem ("ИВТИИбд-35" -> "ИВТИИбд").
fn suggest(entries: &[IdentityEntry], query: &str) -> Vec<String> {
    let stem = query
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '-' || c.is_whitespace());
    let stem = surname(stem).unwrap_or(stem);
    search(entries, stem, MAX_SUGGESTIONS)
        .into_iter()
        .map(|entry| entry.name.clone())
        .collect()
}
