// src/store/memory.rs
//! In-process store with the same semantics as the SQLite one. Used by tests
//! and by runs that do not need persistence.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{IngestionRun, ProgramStore, UpsertOutcome, UserAction};
use crate::profile::Profile;
use crate::program::{Program, ProgramKind};

#[derive(Debug, Default)]
struct Inner {
    programs: BTreeMap<String, Program>,
    profile: Option<Profile>,
    actions: HashMap<(String, UserAction), DateTime<Utc>>,
    runs: Vec<IngestionRun>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }

    pub fn program_count(&self) -> usize {
        self.lock().map(|g| g.programs.len()).unwrap_or(0)
    }
}

impl ProgramStore for MemoryStore {
    fn upsert_program(&self, program: &Program) -> Result<UpsertOutcome> {
        let mut g = self.lock()?;
        let prev = g
            .programs
            .insert(program.program_key.clone(), program.clone());
        Ok(if prev.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_program(&self, program_key: &str) -> Result<Option<Program>> {
        Ok(self.lock()?.programs.get(program_key).cloned())
    }

    fn programs_ingested_since(&self, since: DateTime<Utc>) -> Result<Vec<Program>> {
        Ok(self
            .lock()?
            .programs
            .values()
            .filter(|p| p.ingested_at >= since)
            .cloned()
            .collect())
    }

    fn active_programs(&self, kind: Option<ProgramKind>, today: NaiveDate) -> Result<Vec<Program>> {
        Ok(self
            .lock()?
            .programs
            .values()
            .filter(|p| kind.map_or(true, |k| p.kind == k))
            .filter(|p| p.apply_end_at.map_or(true, |end| end >= today))
            .cloned()
            .collect())
    }

    fn load_profile(&self, seed: &Profile) -> Result<Profile> {
        let mut g = self.lock()?;
        Ok(g.profile.get_or_insert_with(|| seed.clone()).clone())
    }

    fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.lock()?.profile = Some(profile.clone());
        Ok(())
    }

    fn record_action(&self, program_key: &str, action: UserAction, at: DateTime<Utc>) -> Result<()> {
        self.lock()?
            .actions
            .insert((program_key.to_string(), action), at);
        Ok(())
    }

    fn keys_with_action(&self, action: UserAction) -> Result<HashSet<String>> {
        Ok(self
            .lock()?
            .actions
            .keys()
            .filter(|(_, a)| *a == action)
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn log_ingestion_run(&self, run: &IngestionRun) -> Result<()> {
        self.lock()?.runs.push(run.clone());
        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>> {
        let g = self.lock()?;
        let mut runs = g.runs.clone();
        runs.sort_by(|a, b| b.run_at.cmp(&a.run_at));
        runs.truncate(limit);
        Ok(runs)
    }
}
