// src/program.rs
//! Canonical program record shared by ingestion, storage and recommendation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Origin feed identifier stamped on every normalized record.
pub const SOURCE_BIZINFO: &str = "bizinfo";

/// The two record families published by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    Support,
    Event,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 2] = [ProgramKind::Support, ProgramKind::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::Support => "support",
            ProgramKind::Event => "event",
        }
    }

    /// Icon used by the plain-text list formatter.
    pub fn icon(&self) -> &'static str {
        match self {
            ProgramKind::Support => "💰",
            ProgramKind::Event => "📅",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "support" => Ok(ProgramKind::Support),
            "event" | "events" => Ok(ProgramKind::Event),
            other => anyhow::bail!("unknown program kind: {other}"),
        }
    }
}

/// Store identity: `"{kind}:{seq}"`. An empty `seq` yields `"{kind}:"`, which
/// collides across records without an id; that is left visible on purpose.
pub fn program_key(kind: ProgramKind, seq: &str) -> String {
    format!("{}:{}", kind.as_str(), seq)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub program_key: String,
    pub kind: ProgramKind,
    pub source: String,
    pub seq: String,

    pub title: Option<String>,
    pub summary_raw: Option<String>,
    pub agency: Option<String>,
    pub category_l1: Option<String>,
    pub region_raw: Option<String>,

    pub apply_period_raw: Option<String>,
    pub apply_start_at: Option<NaiveDate>,
    pub apply_end_at: Option<NaiveDate>,

    pub event_period_raw: Option<String>,
    pub event_start_at: Option<NaiveDate>,
    pub event_end_at: Option<NaiveDate>,

    pub url: Option<String>,
    pub created_at_source: Option<String>,
    pub updated_at_source: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

impl Program {
    /// Bare record with identity fields only; everything optional left empty.
    pub fn new(kind: ProgramKind, seq: impl Into<String>, ingested_at: DateTime<Utc>) -> Self {
        let seq = seq.into();
        Self {
            program_key: program_key(kind, &seq),
            kind,
            source: SOURCE_BIZINFO.to_string(),
            seq,
            title: None,
            summary_raw: None,
            agency: None,
            category_l1: None,
            region_raw: None,
            apply_period_raw: None,
            apply_start_at: None,
            apply_end_at: None,
            event_period_raw: None,
            event_start_at: None,
            event_end_at: None,
            url: None,
            created_at_source: None,
            updated_at_source: None,
            ingested_at,
        }
    }

    pub fn title_or_default(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => "제목 없음",
        }
    }

    /// Whole days from `today` until the application deadline.
    /// `None` when no deadline was parsed; events never fall back to their event window.
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.apply_end_at.map(|end| (end - today).num_days())
    }
}
