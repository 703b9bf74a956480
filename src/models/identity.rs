// src/models/identity.rs

//! Groups, instructors and the schedule parts that serve group pages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the timetable an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Group,
    Teacher,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::Group => f.write_str("group"),
            IdentityKind::Teacher => f.write_str("teacher"),
        }
    }
}

/// A group or instructor addressable by number or display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub kind: IdentityKind,
    pub number: u32,
    pub display_name: String,
}

/// One `number -> name` row of a static identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub number: u32,
    pub name: String,
}

/// A contiguous range of group numbers served from one URL path.
///
/// The URL uses a part-relative number: the first group of the part is `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePart {
    /// Part identifier (e.g. `1`, `2`)
    pub id: u32,

    /// Human-readable part name
    #[serde(default)]
    pub display_name: String,

    /// First global group number served by this part (inclusive)
    pub range_start: u32,

    /// Last global group number served by this part (inclusive)
    pub range_end: u32,

    /// URL template with a single `{}` placeholder for the local number
    pub url_template: String,
}

impl SchedulePart {
    /// Whether the global group number falls inside this part.
    pub fn contains(&self, number: u32) -> bool {
        (self.range_start..=self.range_end).contains(&number)
    }

    /// Part-relative number used in the page URL.
    pub fn local_number(&self, number: u32) -> u32 {
        number.saturating_sub(self.range_start) + 1
    }

    /// Inverse of [`local_number`](Self::local_number).
    ///
    /// `None` when the sum does not fit a `u32`.
    pub fn global_number(&self, local: u32) -> Option<u32> {
        local.checked_add(self.range_start.saturating_sub(1))
    }

    /// Whether two parts share any group number.
    pub fn overlaps(&self, other: &SchedulePart) -> bool {
        self.range_start <= other.range_end && other.range_start <= self.range_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(start: u32, end: u32) -> SchedulePart {
        SchedulePart {
            id: 2,
            display_name: "Часть 2".into(),
            range_start: start,
            range_end: end,
            url_template: "https://example.com/p2/{}.html".into(),
        }
    }

    #[test]
    fn local_number_is_part_relative() {
        let p = part(116, 234);
        assert_eq!(p.local_number(116), 1);
        assert_eq!(p.local_number(175), 60);
        assert_eq!(p.global_number(60), Some(175));
    }

    #[test]
    fn global_number_overflow_is_none() {
        assert_eq!(part(116, 234).global_number(u32::MAX), None);
        assert_eq!(part(1, 115).global_number(u32::MAX), Some(u32::MAX));
    }

    #[test]
    fn overlap_detection() {
        assert!(part(1, 115).overlaps(&part(115, 200)));
        assert!(!part(1, 115).overlaps(&part(116, 234)));
    }
}
