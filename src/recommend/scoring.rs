//! Additive suitability score for a program against the profile.
//!
//! Matching is case-insensitive substring search over
//! `title + summary + category`:
//! - base                         : 5
//! - any interest keyword         : +25 (once)
//! - include keywords             : +10 each, capped at +30
//! - deadline within threshold    : +15
//! - allowed region in region_raw : reason only, no points
//!
//! The result is clamped to [0, 100].

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::profile::Profile;
use crate::program::Program;

pub const BASE_SCORE: i32 = 5;
pub const INTEREST_BONUS: i32 = 25;
pub const KEYWORD_BONUS: i32 = 10;
pub const KEYWORD_BONUS_CAP: i32 = 30;
pub const DUE_SOON_BONUS: i32 = 15;

/// Why a program earned (or was annotated with) something. Rendered in Korean
/// for the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    InterestMatch,
    KeywordMatch(usize),
    DueSoon(i64),
    RegionMatch(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::InterestMatch => f.write_str("관심분야 일치"),
            Reason::KeywordMatch(n) => write!(f, "키워드 매칭({n}건)"),
            Reason::DueSoon(d) => write!(f, "마감 임박: D-{d}"),
            Reason::RegionMatch(r) => write!(f, "지역 조건 충족({r})"),
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lowercased haystack the keyword rules run against.
pub(crate) fn match_text(program: &Program) -> String {
    [
        program.title.as_deref(),
        program.summary_raw.as_deref(),
        program.category_l1.as_deref(),
    ]
    .map(|s| s.unwrap_or_default())
    .join(" ")
    .to_lowercase()
}

pub(crate) fn contains_ci(haystack_lower: &str, needle: &str) -> bool {
    let n = needle.trim().to_lowercase();
    !n.is_empty() && haystack_lower.contains(&n)
}

/// Score `program` against `profile` as of `today`.
pub fn score(program: &Program, profile: &Profile, today: NaiveDate) -> (i32, Vec<Reason>) {
    let text = match_text(program);
    let mut total = BASE_SCORE;
    let mut reasons = Vec::new();

    if profile.interests.iter().any(|kw| contains_ci(&text, kw)) {
        total += INTEREST_BONUS;
        reasons.push(Reason::InterestMatch);
    }

    // Distinct keywords only: "AI" and "ai" count once.
    let mut seen = std::collections::HashSet::new();
    let hits = profile
        .include_keywords
        .iter()
        .filter(|kw| seen.insert(kw.trim().to_lowercase()))
        .filter(|kw| contains_ci(&text, kw))
        .count();
    if hits > 0 {
        total += (hits as i32 * KEYWORD_BONUS).min(KEYWORD_BONUS_CAP);
        reasons.push(Reason::KeywordMatch(hits));
    }

    if let Some(days) = program.days_remaining(today) {
        if (0..=profile.due_days_threshold).contains(&days) {
            total += DUE_SOON_BONUS;
            reasons.push(Reason::DueSoon(days));
        }
    }

    if let Some(region_raw) = program.region_raw.as_deref().filter(|r| !r.is_empty()) {
        let region_lower = region_raw.to_lowercase();
        if let Some(hit) = profile
            .region_allow
            .iter()
            .find(|r| contains_ci(&region_lower, r))
        {
            reasons.push(Reason::RegionMatch(hit.clone()));
        }
    }

    (total.clamp(0, 100), reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramKind;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn program(title: &str) -> Program {
        let mut p = Program::new(ProgramKind::Support, "1", Utc::now());
        p.title = Some(title.to_string());
        p
    }

    #[test]
    fn bare_program_gets_base_score_only() {
        let (s, r) = score(&program("일반 공고"), &Profile::default(), today());
        assert_eq!(s, BASE_SCORE);
        assert!(r.is_empty());
    }

    #[test]
    fn duplicate_include_keywords_count_once() {
        let profile = Profile {
            include_keywords: vec!["AI".into(), "ai".into()],
            ..Profile::default()
        };
        let (s, r) = score(&program("AI 바우처"), &profile, today());
        assert_eq!(s, BASE_SCORE + KEYWORD_BONUS);
        assert_eq!(r, vec![Reason::KeywordMatch(1)]);
    }

    #[test]
    fn due_soon_boundaries_are_inclusive() {
        let profile = Profile::default();
        let mut p = program("x");
        p.apply_end_at = Some(today());
        assert_eq!(score(&p, &profile, today()).0, BASE_SCORE + DUE_SOON_BONUS);
        p.apply_end_at = today().checked_add_days(chrono::Days::new(7));
        assert_eq!(score(&p, &profile, today()).0, BASE_SCORE + DUE_SOON_BONUS);
        p.apply_end_at = today().checked_add_days(chrono::Days::new(8));
        assert_eq!(score(&p, &profile, today()).0, BASE_SCORE);
    }

    #[test]
    fn region_adds_reason_without_points() {
        let profile = Profile {
            region_allow: vec!["서울".into(), "경기".into()],
            ..Profile::default()
        };
        let mut p = program("x");
        p.region_raw = Some("서울특별시 강남구".into());
        let (s, r) = score(&p, &profile, today());
        assert_eq!(s, BASE_SCORE);
        assert_eq!(r, vec![Reason::RegionMatch("서울".into())]);
        assert_eq!(r[0].to_string(), "지역 조건 충족(서울)");
    }

    #[test]
    fn reasons_render_in_korean() {
        assert_eq!(Reason::KeywordMatch(2).to_string(), "키워드 매칭(2건)");
        assert_eq!(Reason::DueSoon(3).to_string(), "마감 임박: D-3");
        assert_eq!(
            serde_json::to_string(&Reason::InterestMatch).unwrap(),
            "\"관심분야 일치\""
        );
    }
}
