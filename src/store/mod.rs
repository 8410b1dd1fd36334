// src/store/mod.rs
//! Persistence boundary. Programs are upserted by `program_key` (last write
//! wins, full overwrite); the profile is a single row; user actions and
//! ingestion runs are append/replace logs.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::profile::Profile;
use crate::program::{Program, ProgramKind};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Saved,
    Dismissed,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Saved => "saved",
            UserAction::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserAction {
    type Err = anyhow::Error;

    /// Accepts both the stored form (`saved`) and the command verb (`save`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "save" | "saved" => Ok(UserAction::Saved),
            "dismiss" | "dismissed" => Ok(UserAction::Dismissed),
            other => anyhow::bail!("unknown action: {other}"),
        }
    }
}

/// Audit row for one ingestion run of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRun {
    pub run_at: DateTime<Utc>,
    pub kind: ProgramKind,
    pub fetched_count: u32,
    pub new_count: u32,
    pub updated_count: u32,
    pub error: Option<String>,
}

impl IngestionRun {
    pub fn started(kind: ProgramKind, run_at: DateTime<Utc>) -> Self {
        Self {
            run_at,
            kind,
            fetched_count: 0,
            new_count: 0,
            updated_count: 0,
            error: None,
        }
    }
}

/// Storage abstraction so ingestion and the API can be exercised in isolation.
pub trait ProgramStore: Send + Sync {
    fn upsert_program(&self, program: &Program) -> Result<UpsertOutcome>;
    fn get_program(&self, program_key: &str) -> Result<Option<Program>>;
    fn programs_ingested_since(&self, since: DateTime<Utc>) -> Result<Vec<Program>>;
    /// Programs whose deadline is unknown or not before `today`.
    fn active_programs(&self, kind: Option<ProgramKind>, today: NaiveDate)
        -> Result<Vec<Program>>;

    /// Returns the stored profile, creating it from `seed` on first use.
    fn load_profile(&self, seed: &Profile) -> Result<Profile>;
    fn save_profile(&self, profile: &Profile) -> Result<()>;

    fn record_action(&self, program_key: &str, action: UserAction, at: DateTime<Utc>)
        -> Result<()>;
    fn keys_with_action(&self, action: UserAction) -> Result<HashSet<String>>;

    fn log_ingestion_run(&self, run: &IngestionRun) -> Result<()>;
    fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_accepts_verb_and_past_tense() {
        assert_eq!("save".parse::<UserAction>().unwrap(), UserAction::Saved);
        assert_eq!("Dismissed".parse::<UserAction>().unwrap(), UserAction::Dismissed);
        assert!("open".parse::<UserAction>().is_err());
    }
}
