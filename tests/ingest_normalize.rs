// tests/ingest_normalize.rs
use bizinfo_recommender::ingest::normalize::{
    fallback_url, normalize, normalize_event, normalize_support, EVENT_CATEGORY,
};
use bizinfo_recommender::ingest::types::RawRecord;
use bizinfo_recommender::profile::Profile;
use bizinfo_recommender::program::{ProgramKind, SOURCE_BIZINFO};
use bizinfo_recommender::recommend::{is_recommended, score};
use chrono::{NaiveDate, TimeZone, Utc};

fn ingested() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

#[test]
fn first_non_blank_key_wins() {
    let raw = RawRecord::new()
        .with("pblancId", "PBLN_1")
        .with("pblancSumry", "")
        .with("bsnsSumryCn", "요약 본문")
        .with("pblancCn", "상세 본문");
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.summary_raw.as_deref(), Some("요약 본문"));
}

#[test]
fn identity_and_provenance() {
    let raw = RawRecord::new().with("pblancId", "PBLN_42").with("pblancNm", "공고");
    let p = normalize(&raw, ProgramKind::Support, ingested());
    assert_eq!(p.program_key, "support:PBLN_42");
    assert_eq!(p.kind, ProgramKind::Support);
    assert_eq!(p.source, SOURCE_BIZINFO);
    assert_eq!(p.ingested_at, ingested());
}

#[test]
fn missing_link_uses_template() {
    let raw = RawRecord::new().with("pblancId", "PBLN_7");
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.url, Some(fallback_url("PBLN_7")));
    assert!(p.url.unwrap().ends_with("pblancId=PBLN_7"));
}

#[test]
fn event_windows_are_separate() {
    let raw = RawRecord::new()
        .with("eventInfoId", "EVT_3")
        .with("rceptPeriod", "2024.06.01 ~ 2024.06.10")
        .with("eventBeginEndDt", "2024.06.15 ~ 2024.06.16")
        .with("eventClCd", "세미나");
    let p = normalize_event(&raw, ingested());
    assert_eq!(p.program_key, "event:EVT_3");
    assert_eq!(p.apply_end_at, NaiveDate::from_ymd_opt(2024, 6, 10));
    assert_eq!(p.event_start_at, NaiveDate::from_ymd_opt(2024, 6, 15));
    assert_eq!(p.event_end_at, NaiveDate::from_ymd_opt(2024, 6, 16));
    assert_eq!(p.category_l1.as_deref(), Some("세미나"));
}

#[test]
fn event_category_defaults_when_blank() {
    let raw = RawRecord::new().with("eventId", "EVT_4").with("eventClCd", "  ");
    let p = normalize_event(&raw, ingested());
    assert_eq!(p.category_l1.as_deref(), Some(EVENT_CATEGORY));
}

#[test]
fn support_ignores_event_window_keys() {
    let raw = RawRecord::new()
        .with("pblancId", "PBLN_5")
        .with("eventPeriod", "2024-06-20");
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.event_period_raw, None);
    assert_eq!(p.event_start_at, None);
}

#[test]
fn raw_period_text_is_kept_verbatim() {
    let raw = RawRecord::new()
        .with("pblancId", "PBLN_6")
        .with("reqstBeginEndDe", "2024.07.01 ~ 2024.07.31");
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.apply_period_raw.as_deref(), Some("2024.07.01 ~ 2024.07.31"));
    assert_eq!(p.apply_start_at, NaiveDate::from_ymd_opt(2024, 7, 1));
}

#[test]
fn escaped_brackets_in_title_are_kept() {
    let raw = RawRecord::new()
        .with("pblancId", "PBLN_8")
        .with("pblancNm", "&lt;2024 AI 바우처&gt; 공고");
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.title.as_deref(), Some("<2024 AI 바우처> 공고"));

    let profile = Profile {
        interests: vec!["AI".into()],
        min_score: 0,
        ..Profile::default()
    };
    let (score, _) = score(&p, &profile, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(score, 30);
}

#[test]
fn long_summary_is_not_truncated_before_filtering() {
    let body = format!("{}대부업", "가".repeat(2100));
    let raw = RawRecord::new()
        .with("pblancId", "PBLN_9")
        .with("pblancNm", "운영자금 지원")
        .with("bsnsSumryCn", body.as_str());
    let p = normalize_support(&raw, ingested());
    assert_eq!(p.summary_raw.as_deref().map(|s| s.chars().count()), Some(2103));

    let profile = Profile {
        exclude_keywords: vec!["대부업".into()],
        min_score: 0,
        ..Profile::default()
    };
    let rec = is_recommended(&p, &profile, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert!(!rec.included);
}
