// src/digest.rs
//! Listing queries over stored programs and the plain-text rendering shared by
//! the notifiers and the HTTP API.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashSet;

use crate::action_token;
use crate::profile::Profile;
use crate::program::{Program, ProgramKind};
use crate::recommend::{is_recommended, rank, ScoredCandidate};
use crate::store::{ProgramStore, UserAction};

pub const DEFAULT_LIMIT: usize = 10;
/// Telegram rejects longer messages.
pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Window for "new" programs in the daily digest.
pub const DIGEST_WINDOW_HOURS: i64 = 24;

/// One of the list commands: everything, one kind, or deadline-only views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub kind: Option<ProgramKind>,
    pub due_only: bool,
    pub limit: usize,
}

impl ListQuery {
    pub fn all() -> Self {
        Self {
            kind: None,
            due_only: false,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn of_kind(kind: ProgramKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::all()
        }
    }

    pub fn due(kind: Option<ProgramKind>) -> Self {
        Self {
            kind,
            due_only: true,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(n) = limit.filter(|n| *n > 0) {
            self.limit = n;
        }
        self
    }

    pub fn title(&self) -> String {
        let scope = self.kind.map_or("전체", |k| match k {
            ProgramKind::Support => "지원사업",
            ProgramKind::Event => "행사",
        });
        if self.due_only {
            format!("추천 마감임박 ({scope})")
        } else {
            format!("추천 ({scope})")
        }
    }
}

/// `?limit=` on the list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitParam {
    pub limit: Option<usize>,
}

/// Pure selection behind the list commands. `programs` should already be the
/// active set; dismissed keys are dropped, the filter decides the rest.
pub fn select_listing(
    programs: &[Program],
    dismissed: &HashSet<String>,
    profile: &Profile,
    today: NaiveDate,
    query: ListQuery,
) -> Vec<ScoredCandidate> {
    let mut out: Vec<ScoredCandidate> = programs
        .iter()
        .filter(|p| query.kind.map_or(true, |k| p.kind == k))
        .filter(|p| !dismissed.contains(&p.program_key))
        .filter(|p| {
            !query.due_only
                || p.days_remaining(today)
                    .is_some_and(|d| (0..=profile.due_days_threshold).contains(&d))
        })
        .filter_map(|p| {
            let rec = is_recommended(p, profile, today);
            rec.included.then(|| ScoredCandidate {
                program: p.clone(),
                score: rec.score,
                reasons: rec.reasons,
            })
        })
        .collect();

    if query.due_only {
        out.sort_by_key(|c| c.program.days_remaining(today).unwrap_or(i64::MAX));
    } else {
        out.sort_by(|a, b| b.score.cmp(&a.score));
    }
    out.truncate(query.limit);
    out
}

/// Pure selection behind the daily digest: recently ingested, not dismissed,
/// recommended, best first.
pub fn select_digest(
    recent: &[Program],
    dismissed: &HashSet<String>,
    profile: &Profile,
    today: NaiveDate,
    limit: usize,
) -> Vec<ScoredCandidate> {
    let mut out = rank(
        recent.iter().filter(|p| !dismissed.contains(&p.program_key)),
        profile,
        today,
    );
    out.truncate(limit);
    out
}

pub fn listing(
    store: &dyn ProgramStore,
    profile: &Profile,
    today: NaiveDate,
    query: ListQuery,
) -> Result<Vec<ScoredCandidate>> {
    let programs = store.active_programs(query.kind, today)?;
    let dismissed = store.keys_with_action(UserAction::Dismissed)?;
    Ok(select_listing(&programs, &dismissed, profile, today, query))
}

pub fn digest(
    store: &dyn ProgramStore,
    profile: &Profile,
    now: DateTime<Utc>,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<ScoredCandidate>> {
    let recent = store.programs_ingested_since(now - Duration::hours(DIGEST_WINDOW_HOURS))?;
    let dismissed = store.keys_with_action(UserAction::Dismissed)?;
    Ok(select_digest(&recent, &dismissed, profile, today, limit))
}

pub fn format_candidate(c: &ScoredCandidate) -> String {
    let p = &c.program;
    let mut out = format!("{} [{}점] {}\n", p.kind.icon(), c.score, p.title_or_default());
    if let Some(end) = p.apply_end_at {
        out.push_str(&format!("⏳ 마감: {}\n", end.format("%Y-%m-%d")));
    }
    if !c.reasons.is_empty() {
        let reasons: Vec<String> = c.reasons.iter().map(ToString::to_string).collect();
        out.push_str(&format!("💡 {}\n", reasons.join(", ")));
    }
    out.push_str(&format!("🔗 {}\n", p.url.as_deref().unwrap_or("#")));
    out.push_str(&format!(
        "👉 {} | {}\n",
        action_token::command(UserAction::Saved, &p.program_key),
        action_token::command(UserAction::Dismissed, &p.program_key),
    ));
    out
}

pub fn format_list(title: &str, candidates: &[ScoredCandidate]) -> String {
    if candidates.is_empty() {
        return format!("📭 {title}: 결과가 없습니다.");
    }
    let mut msg = format!("📢 {title} ({}건)\n\n", candidates.len());
    for c in candidates {
        msg.push_str(&format_candidate(c));
        msg.push('\n');
    }
    msg
}

/// Split into pieces of at most `max_chars` characters, breaking after a
/// newline when one is available.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for line in text.split_inclusive('\n') {
        let len = line.chars().count();
        if count + len > max_chars && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            count = 0;
        }
        if len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if count + piece.len() > max_chars {
                    out.push(std::mem::take(&mut current));
                    count = 0;
                }
                current.extend(piece);
                count += piece.len();
            }
        } else {
            current.push_str(line);
            count += len;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
