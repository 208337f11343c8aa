//! Small helpers for string truncation, timestamp parsing and API base URLs.
//!
//! All truncation counts Unicode scalar values, so a cut never lands inside a
//! multi-byte character.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use url::Url;

/// Ellipsis appended to anything cut short.
pub const ELLIPSIS: &str = "...";

/// Hard-cut `s` so the result, ellipsis included, fits in `max` characters.
///
/// Strings already within `max` are returned unchanged. No attempt is made to
/// respect word boundaries.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_with_ellipsis("abcdef", 5), "ab...");
/// assert_eq!(truncate_with_ellipsis("abc", 5), "abc");
/// ```
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Keep the first `max` characters of `s` and append an ellipsis if anything was dropped.
///
/// Unlike [`truncate_with_ellipsis`] the ellipsis is not counted against `max`.
pub fn truncate_then_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with `"…(+N chars)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 (`2024-05-06T12:00:00Z`, `...+02:00`) and offset-less
/// ISO 8601 (`2024-05-06T12:00:00.123456`), which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse an API root URL, making sure it ends in `/` so that `Url::join`
/// appends endpoint paths instead of replacing the last segment.
pub fn base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

/// HTTP client shared by the API wrappers; every request gives up after `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_with_ellipsis_short_string() {
        assert_eq!(truncate_with_ellipsis("Hello, world!", 200), "Hello, world!");
    }

    #[test]
    fn test_truncate_with_ellipsis_exact_length() {
        let s = "a".repeat(200);
        assert_eq!(truncate_with_ellipsis(&s, 200), s);
    }

    #[test]
    fn test_truncate_with_ellipsis_long_string() {
        let s = "a".repeat(250);
        let result = truncate_with_ellipsis(&s, 200);
        assert_eq!(result.chars().count(), 200);
        assert!(result.ends_with("..."));
        assert!(result.starts_with(&"a".repeat(197)));
    }

    #[test]
    fn test_truncate_with_ellipsis_multibyte() {
        let s = "é".repeat(10);
        let result = truncate_with_ellipsis(&s, 5);
        assert_eq!(result, "éé...");
    }

    #[test]
    fn test_truncate_then_ellipsis() {
        let s = "b".repeat(600);
        let result = truncate_then_ellipsis(&s, 500);
        assert_eq!(result.chars().count(), 503);
        assert!(result.ends_with("..."));
        assert_eq!(truncate_then_ellipsis("short", 500), "short");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 chars)"));
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let parsed = parse_timestamp("2024-05-06T12:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap());

        let offset = parse_timestamp("2024-05-06T14:00:00+02:00").unwrap();
        assert_eq!(offset, parsed);
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let parsed = parse_timestamp("2024-05-06T12:00:00.123456").unwrap();
        assert_eq!(parsed.date_naive().to_string(), "2024-05-06");
        assert_eq!(parsed.timestamp(), Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let base = base_url("https://lemmy.world").unwrap();
        assert_eq!(base.join("api/v3/post").unwrap().as_str(), "https://lemmy.world/api/v3/post");

        let nested = base_url("http://127.0.0.1:8080/proxy").unwrap();
        assert_eq!(
            nested.join("youtube/v3/videos").unwrap().as_str(),
            "http://127.0.0.1:8080/proxy/youtube/v3/videos"
        );
    }
}
