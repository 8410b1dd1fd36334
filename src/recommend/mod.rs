// src/recommend/mod.rs
//! Recommendation pipeline: score programs against one profile snapshot and
//! rank the ones that pass the filter.
//!
//! Everything in here is pure. Callers pass `today` (KST) and a profile they
//! will not mutate for the duration of the pass.

pub mod filter;
pub mod scoring;

use chrono::NaiveDate;
use serde::Serialize;

use crate::profile::Profile;
use crate::program::Program;

pub use filter::{is_recommended, Recommendation};
pub use scoring::{score, Reason};

/// One ranked entry. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub program: Program,
    pub score: i32,
    pub reasons: Vec<Reason>,
}

/// Keep recommended programs, highest score first. Ties keep input order.
pub fn rank<'a, I>(programs: I, profile: &Profile, today: NaiveDate) -> Vec<ScoredCandidate>
where
    I: IntoIterator<Item = &'a Program>,
{
    let mut out: Vec<ScoredCandidate> = programs
        .into_iter()
        .filter_map(|p| {
            let rec = is_recommended(p, profile, today);
            rec.included.then(|| ScoredCandidate {
                program: p.clone(),
                score: rec.score,
                reasons: rec.reasons,
            })
        })
        .collect();
    out.sort_by(|a, b| b.score.cmp(&a.score));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramKind;
    use chrono::Utc;

    #[test]
    fn rank_orders_by_score_and_drops_excluded() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let profile = Profile {
            interests: vec!["AI".into()],
            exclude_keywords: vec!["폐업".into()],
            min_score: 5,
            ..Profile::default()
        };
        let mut a = Program::new(ProgramKind::Support, "a", Utc::now());
        a.title = Some("일반".into());
        let mut b = Program::new(ProgramKind::Support, "b", Utc::now());
        b.title = Some("AI 실증".into());
        let mut c = Program::new(ProgramKind::Support, "c", Utc::now());
        c.title = Some("AI 폐업 지원".into());

        let ranked = rank([&a, &b, &c], &profile, today);
        let keys: Vec<_> = ranked.iter().map(|s| s.program.seq.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(ranked[0].score, 30);
    }
}
