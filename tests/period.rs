// tests/period.rs
use bizinfo_recommender::period::{parse_iso, parse_period, Period};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, day)
}

#[test]
fn dash_and_dot_ranges_agree() {
    let dash = parse_period(Some("2023-01-01 ~ 2023-12-31"));
    let dot = parse_period(Some("2023.01.01 ~ 2023.12.31"));
    assert_eq!(dash, Period::new(d(2023, 1, 1), d(2023, 12, 31)));
    assert_eq!(dash, dot);
}

#[test]
fn single_date_fills_both_sides() {
    assert_eq!(
        parse_period(Some("2023-10-10")),
        Period::new(d(2023, 10, 10), d(2023, 10, 10))
    );
}

#[test]
fn empty_or_absent_is_empty() {
    assert!(parse_period(None).is_empty());
    assert!(parse_period(Some("")).is_empty());
    assert!(parse_period(Some("   ")).is_empty());
    assert!(parse_period(Some("상시 접수")).is_empty());
}

#[test]
fn text_between_first_date_and_tilde_is_ignored() {
    let p = parse_period(Some("2024-05-01 18:00 (수) ~ 2024-05-10 23:59"));
    assert_eq!(p, Period::new(d(2024, 5, 1), d(2024, 5, 10)));
}

#[test]
fn full_width_tilde_and_wave_dash() {
    let expected = Period::new(d(2024, 3, 4), d(2024, 3, 29));
    assert_eq!(parse_period(Some("2024.03.04 ～ 2024.03.29")), expected);
    assert_eq!(parse_period(Some("2024.03.04〜2024.03.29")), expected);
}

#[test]
fn calendar_invalid_date_is_absent() {
    let p = parse_period(Some("2023-02-30 ~ 2023-03-10"));
    assert_eq!(p, Period::new(None, d(2023, 3, 10)));
    assert!(parse_period(Some("2023-13-01")).is_empty());
}

#[test]
fn compact_dates_are_not_recognised() {
    assert!(parse_period(Some("20240701 ~ 20240731")).is_empty());
}

#[test]
fn parse_iso_takes_first_date() {
    assert_eq!(parse_iso(Some("등록일 2024.06.01 09:00")), d(2024, 6, 1));
    assert_eq!(parse_iso(Some("no date")), None);
    assert_eq!(parse_iso(None), None);
}
