// src/period.rs
//! Period parser: pulls a start/end date out of free-text period strings such as
//! `"2024.03.04 ~ 2024.03.29"` or `"2024-05-01 18:00 ~ 2024-05-10"`.
//!
//! Rules:
//! - dots and dashes are interchangeable separators;
//! - `~` (and the full-width `～` / wave dash `〜`) marks a range, anything between
//!   the first date and the tilde is ignored (times of day, weekday names, ...);
//! - a lone date is returned as both start and end;
//! - anything else yields `(None, None)`. Nothing here ever fails.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;

/// Start/end pair extracted from a period string. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Period {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

fn re_range() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2}).*?~\s*(\d{4}-\d{2}-\d{2})").expect("period range regex")
    })
}

fn re_single() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("period date regex"))
}

/// Unify separators so one pattern covers every documented spelling.
fn clean(text: &str) -> String {
    text.trim()
        .replace('.', "-")
        .replace(['\u{FF5E}', '\u{301C}'], "~")
}

fn to_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a period description into a [`Period`].
pub fn parse_period(text: Option<&str>) -> Period {
    let Some(raw) = text.filter(|t| !t.trim().is_empty()) else {
        return Period::default();
    };
    let cleaned = clean(raw);

    if let Some(caps) = re_range().captures(&cleaned) {
        return Period::new(to_date(&caps[1]), to_date(&caps[2]));
    }

    // A lone date is ambiguous (deadline vs. single-day event); downstream due-soon
    // logic needs `end` populated, so it fills both sides.
    if let Some(m) = re_single().find(&cleaned) {
        let d = to_date(m.as_str());
        return Period::new(d, d);
    }

    Period::default()
}

/// First date found anywhere in `text`, normalized to a calendar date.
pub fn parse_iso(text: Option<&str>) -> Option<NaiveDate> {
    let raw = text?;
    let cleaned = clean(raw);
    re_single().find(&cleaned).and_then(|m| to_date(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    #[test]
    fn trailing_time_on_start_is_ignored() {
        let p = parse_period(Some("2024-05-01 18:00 ~ 2024-05-10 23:59"));
        assert_eq!(p, Period::new(d("2024-05-01"), d("2024-05-10")));
    }

    #[test]
    fn full_width_tilde_is_a_range_marker() {
        let p = parse_period(Some("2024.01.02 ～ 2024.02.03"));
        assert_eq!(p, Period::new(d("2024-01-02"), d("2024-02-03")));
    }

    #[test]
    fn invalid_calendar_date_degrades_to_none() {
        let p = parse_period(Some("2023-02-30 ~ 2023-03-10"));
        assert_eq!(p.start, None);
        assert_eq!(p.end, d("2023-03-10"));
    }

    #[test]
    fn text_without_dates_is_empty() {
        assert!(parse_period(Some("상시 접수")).is_empty());
        assert!(parse_period(Some("   ")).is_empty());
    }

    #[test]
    fn parse_iso_takes_first_date() {
        assert_eq!(parse_iso(Some("등록일 2024.07.15 10:00:00")), d("2024-07-15"));
        assert_eq!(parse_iso(Some("no date")), None);
        assert_eq!(parse_iso(None), None);
    }
}
