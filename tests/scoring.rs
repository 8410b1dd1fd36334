// tests/scoring.rs
use bizinfo_recommender::profile::Profile;
use bizinfo_recommender::program::{Program, ProgramKind};
use bizinfo_recommender::recommend::scoring::{
    score, Reason, BASE_SCORE, DUE_SOON_BONUS, INTEREST_BONUS, KEYWORD_BONUS_CAP,
};
use chrono::{Duration, NaiveDate, Utc};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn program(title: &str, summary: &str) -> Program {
    let mut p = Program::new(ProgramKind::Support, "S1", Utc::now());
    p.title = Some(title.to_string());
    p.summary_raw = Some(summary.to_string());
    p
}

#[test]
fn one_interest_match_adds_exactly_25() {
    let p = program("AI 바우처", "");
    let without = Profile::default();
    let with = Profile {
        interests: vec!["ai".into(), "로봇".into()],
        ..Profile::default()
    };
    let (a, _) = score(&p, &without, today());
    let (b, reasons) = score(&p, &with, today());
    assert_eq!(a, BASE_SCORE);
    assert_eq!(b, a + INTEREST_BONUS);
    assert_eq!(b, 30);
    assert_eq!(reasons, vec![Reason::InterestMatch]);
}

#[test]
fn keyword_bonus_caps_at_30() {
    let p = program("AI 빅데이터 클라우드 수출 바우처", "");
    let three = Profile {
        include_keywords: vec!["AI".into(), "빅데이터".into(), "클라우드".into()],
        ..Profile::default()
    };
    let five = Profile {
        include_keywords: vec![
            "AI".into(),
            "빅데이터".into(),
            "클라우드".into(),
            "수출".into(),
            "바우처".into(),
        ],
        ..Profile::default()
    };
    let (s3, _) = score(&p, &three, today());
    let (s5, r5) = score(&p, &five, today());
    assert_eq!(s3, BASE_SCORE + KEYWORD_BONUS_CAP);
    assert_eq!(s5, s3);
    // the reason reports the uncapped count
    assert_eq!(r5, vec![Reason::KeywordMatch(5)]);
    assert_eq!(r5[0].to_string(), "키워드 매칭(5건)");
}

#[test]
fn due_soon_window_is_inclusive() {
    let profile = Profile::default();
    for (offset, bonus) in [(-1, false), (0, true), (7, true), (8, false)] {
        let mut p = program("공고", "");
        p.apply_end_at = Some(today() + Duration::days(offset));
        let (s, reasons) = score(&p, &profile, today());
        if bonus {
            assert_eq!(s, BASE_SCORE + DUE_SOON_BONUS, "offset {offset}");
            assert_eq!(reasons, vec![Reason::DueSoon(offset)]);
        } else {
            assert_eq!(s, BASE_SCORE, "offset {offset}");
        }
    }
}

#[test]
fn event_window_never_counts_as_deadline() {
    let mut p = program("행사", "");
    p.kind = ProgramKind::Event;
    p.event_end_at = Some(today() + Duration::days(2));
    let (s, reasons) = score(&p, &Profile::default(), today());
    assert_eq!(s, BASE_SCORE);
    assert!(reasons.is_empty());
}

#[test]
fn region_adds_reason_but_no_points() {
    let mut p = program("공고", "");
    p.region_raw = Some("서울특별시".into());
    let profile = Profile {
        region_allow: vec!["부산".into(), "서울".into(), "서울특별시".into()],
        ..Profile::default()
    };
    let (s, reasons) = score(&p, &profile, today());
    assert_eq!(s, BASE_SCORE);
    assert_eq!(reasons, vec![Reason::RegionMatch("서울".into())]);
    assert_eq!(reasons[0].to_string(), "지역 조건 충족(서울)");
}

#[test]
fn category_is_part_of_the_match_text() {
    let mut p = program("공고", "");
    p.category_l1 = Some("수출".into());
    let profile = Profile {
        interests: vec!["수출".into()],
        ..Profile::default()
    };
    assert_eq!(score(&p, &profile, today()).0, BASE_SCORE + INTEREST_BONUS);
}

#[test]
fn all_bonuses_together() {
    let mut p = program("AI 수출 바우처", "빅데이터");
    p.apply_end_at = Some(today() + Duration::days(3));
    let profile = Profile {
        interests: vec!["AI".into()],
        include_keywords: vec!["수출".into(), "바우처".into(), "빅데이터".into()],
        ..Profile::default()
    };
    let (s, reasons) = score(&p, &profile, today());
    assert_eq!(s, 5 + 25 + 30 + 15);
    assert_eq!(
        reasons,
        vec![Reason::InterestMatch, Reason::KeywordMatch(3), Reason::DueSoon(3)]
    );
}
