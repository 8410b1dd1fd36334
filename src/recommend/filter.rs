//! Hard exclusions composed with the score threshold.

use chrono::NaiveDate;

use super::scoring::{contains_ci, score, Reason};
use crate::profile::Profile;
use crate::program::Program;

/// Outcome of [`is_recommended`]. Excluded programs carry score 0 and no reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub included: bool,
    pub score: i32,
    pub reasons: Vec<Reason>,
}

impl Recommendation {
    fn excluded() -> Self {
        Self {
            included: false,
            score: 0,
            reasons: Vec::new(),
        }
    }
}

/// Exclude keywords are checked against title, summary, agency and URL,
/// independent of region or interest settings.
pub fn hits_exclude_keyword(program: &Program, profile: &Profile) -> bool {
    if profile.exclude_keywords.is_empty() {
        return false;
    }
    let haystack = [
        program.title.as_deref(),
        program.summary_raw.as_deref(),
        program.agency.as_deref(),
        program.url.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    profile
        .exclude_keywords
        .iter()
        .any(|kw| contains_ci(&haystack, kw))
}

pub fn deadline_passed(program: &Program, today: NaiveDate) -> bool {
    program.days_remaining(today).is_some_and(|d| d < 0)
}

/// Final include/exclude decision. Order:
/// 1. exclude keyword
/// 2. region: never excludes (ambiguous region data must not drop a program)
/// 3. deadline already passed
/// 4. `score >= min_score`
pub fn is_recommended(program: &Program, profile: &Profile, today: NaiveDate) -> Recommendation {
    if hits_exclude_keyword(program, profile) {
        return Recommendation::excluded();
    }
    if deadline_passed(program, today) {
        return Recommendation::excluded();
    }

    let (score, reasons) = score(program, profile, today);
    Recommendation {
        included: score >= profile.min_score,
        score,
        reasons,
    }
}
