// src/utils/url.rs

//! URL template utilities.
//!
//! Page URLs are built from templates with a single `{}` placeholder. The
//! portal mixes raw Cyrillic and percent-encoded paths, so comparisons go
//! through [`normalize`] first.

/// Marker substituted for the placeholder while normalizing a template.
const LOCAL_MARKER: &str = "__local__";

/// Substitute `value` into the template's `{}` placeholder.
///
/// # Examples
/// ```
/// use timetable::utils::url::fill_template;
///
/// assert_eq!(
///     fill_template("https://example.com/p1/{}.html", 7),
///     "https://example.com/p1/7.html"
/// );
/// ```
pub fn fill_template(template: &str, value: u32) -> String {
    template.replacen("{}", &value.to_string(), 1)
}

/// Canonical form of a URL: parsed and re-serialized, so raw and
/// percent-encoded spellings of the same path compare equal.
pub fn normalize(url: &str) -> String {
    url::Url::parse(url.trim())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.trim().to_string())
}

/// Recover the number substituted into `template` to produce `url`.
///
/// Returns `None` when the URL was not built from this template.
pub fn match_template(template: &str, url: &str) -> Option<u32> {
    let pattern = normalize(&template.replacen("{}", LOCAL_MARKER, 1));
    let (prefix, suffix) = pattern.split_once(LOCAL_MARKER)?;
    let candidate = normalize(url);

    let middle = candidate.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if middle.is_empty() || !middle.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    middle.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "https://lk.ulstu.ru/timetable/shared/schedule/Часть%202%20–%20ФИСТ,%20ГФ/{}.html";

    #[test]
    fn test_fill_and_match() {
        let url = fill_template(TEMPLATE, 60);
        assert_eq!(match_template(TEMPLATE, &url), Some(60));
    }

    #[test]
    fn test_match_ignores_encoding_differences() {
        let raw = "https://lk.ulstu.ru/timetable/shared/schedule/Часть 2 – ФИСТ, ГФ/12.html";
        assert_eq!(match_template(TEMPLATE, raw), Some(12));
    }

    #[test]
    fn test_match_rejects_other_templates() {
        let url = "https://lk.ulstu.ru/timetable/shared/teachers/m12.html";
        assert_eq!(match_template(TEMPLATE, url), None);
        assert_eq!(
            match_template("https://example.com/{}.html", "https://example.com/abc.html"),
            None
        );
    }
}
