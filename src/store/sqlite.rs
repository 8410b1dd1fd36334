// src/store/sqlite.rs
//! SQLite-backed store. One connection behind a mutex, so writes for the same
//! `program_key` are serialized.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{IngestionRun, ProgramStore, UpsertOutcome, UserAction};
use crate::profile::{KstTime, Profile};
use crate::program::{Program, ProgramKind};

pub const DEFAULT_DB_PATH: &str = "data/bot.db";

const PROGRAM_COLUMNS: &str = "program_key, kind, source, seq, title, summary_raw, agency, \
     category_l1, region_raw, apply_period_raw, apply_start_at, apply_end_at, event_period_raw, \
     event_start_at, event_end_at, url, created_at_source, updated_at_source, ingested_at";

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        CREATE TABLE IF NOT EXISTS programs (
            program_key       TEXT PRIMARY KEY,
            kind              TEXT NOT NULL,
            source            TEXT NOT NULL,
            seq               TEXT NOT NULL,
            title             TEXT,
            summary_raw       TEXT,
            agency            TEXT,
            category_l1       TEXT,
            region_raw        TEXT,
            apply_period_raw  TEXT,
            apply_start_at    TEXT,
            apply_end_at      TEXT,
            event_period_raw  TEXT,
            event_start_at    TEXT,
            event_end_at      TEXT,
            url               TEXT,
            created_at_source TEXT,
            updated_at_source TEXT,
            ingested_at       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_programs_ingested_at
            ON programs(ingested_at DESC);

        CREATE TABLE IF NOT EXISTS company_profile (
            id                 INTEGER PRIMARY KEY CHECK(id = 1),
            region_allow       TEXT NOT NULL,
            interests          TEXT NOT NULL,
            include_keywords   TEXT NOT NULL,
            exclude_keywords   TEXT NOT NULL,
            min_score          INTEGER NOT NULL DEFAULT 60,
            notify_enabled     INTEGER NOT NULL DEFAULT 1,
            notify_time_kst    TEXT NOT NULL DEFAULT '08:30',
            due_days_threshold INTEGER NOT NULL DEFAULT 7
        );

        CREATE TABLE IF NOT EXISTS user_actions (
            program_key TEXT NOT NULL,
            action      TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE(program_key, action)
        );

        CREATE TABLE IF NOT EXISTS ingestion_runs (
            run_at        TEXT NOT NULL,
            kind          TEXT NOT NULL,
            fetched_count INTEGER NOT NULL,
            new_count     INTEGER NOT NULL,
            updated_count INTEGER NOT NULL,
            error         TEXT
        );
        "#,
    )?;
    Ok(())
}

/// Fixed-width UTC timestamp, so text comparison in SQL orders correctly.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn date(d: &Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.format("%Y-%m-%d").to_string())
}

fn conversion_err(idx: usize, e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn get_kind(row: &Row<'_>, idx: usize) -> rusqlite::Result<ProgramKind> {
    let raw: String = row.get(idx)?;
    raw.parse::<ProgramKind>().map_err(|e| conversion_err(idx, e))
}

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        program_key: row.get(0)?,
        kind: get_kind(row, 1)?,
        source: row.get(2)?,
        seq: row.get(3)?,
        title: row.get(4)?,
        summary_raw: row.get(5)?,
        agency: row.get(6)?,
        category_l1: row.get(7)?,
        region_raw: row.get(8)?,
        apply_period_raw: row.get(9)?,
        apply_start_at: get_date(row, 10)?,
        apply_end_at: get_date(row, 11)?,
        event_period_raw: row.get(12)?,
        event_start_at: get_date(row, 13)?,
        event_end_at: get_date(row, 14)?,
        url: row.get(15)?,
        created_at_source: row.get(16)?,
        updated_at_source: row.get(17)?,
        ingested_at: get_ts(row, 18)?,
    })
}

fn list_from_json(idx: usize, raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| conversion_err(idx, e))
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let notify_raw: String = row.get(6)?;
    Ok(Profile {
        region_allow: list_from_json(0, row.get(0)?)?,
        interests: list_from_json(1, row.get(1)?)?,
        include_keywords: list_from_json(2, row.get(2)?)?,
        exclude_keywords: list_from_json(3, row.get(3)?)?,
        min_score: row.get(4)?,
        notify_enabled: row.get::<_, i64>(5)? != 0,
        notify_time_kst: KstTime::parse_or_default(&notify_raw),
        due_days_threshold: row.get(7)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<IngestionRun> {
    Ok(IngestionRun {
        run_at: get_ts(row, 0)?,
        kind: get_kind(row, 1)?,
        fetched_count: row.get(2)?,
        new_count: row.get(3)?,
        updated_count: row.get(4)?,
        error: row.get(5)?,
    })
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and create, including parent directories) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating db directory {}", dir.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        ensure_schema(&conn).context("creating sqlite schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    fn query_programs(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Program>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, program_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("reading programs")
    }
}

impl ProgramStore for SqliteStore {
    fn upsert_program(&self, p: &Program) -> Result<UpsertOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM programs WHERE program_key = ?1",
                params![p.program_key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let sql = format!(
            "INSERT INTO programs ({PROGRAM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT(program_key) DO UPDATE SET
                kind = excluded.kind, source = excluded.source, seq = excluded.seq,
                title = excluded.title, summary_raw = excluded.summary_raw,
                agency = excluded.agency, category_l1 = excluded.category_l1,
                region_raw = excluded.region_raw, apply_period_raw = excluded.apply_period_raw,
                apply_start_at = excluded.apply_start_at, apply_end_at = excluded.apply_end_at,
                event_period_raw = excluded.event_period_raw,
                event_start_at = excluded.event_start_at, event_end_at = excluded.event_end_at,
                url = excluded.url, created_at_source = excluded.created_at_source,
                updated_at_source = excluded.updated_at_source, ingested_at = excluded.ingested_at"
        );
        tx.execute(
            &sql,
            params![
                p.program_key,
                p.kind.as_str(),
                p.source,
                p.seq,
                p.title,
                p.summary_raw,
                p.agency,
                p.category_l1,
                p.region_raw,
                p.apply_period_raw,
                date(&p.apply_start_at),
                date(&p.apply_end_at),
                p.event_period_raw,
                date(&p.event_start_at),
                date(&p.event_end_at),
                p.url,
                p.created_at_source,
                p.updated_at_source,
                ts(&p.ingested_at),
            ],
        )
        .with_context(|| format!("upserting {}", p.program_key))?;
        tx.commit()?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_program(&self, program_key: &str) -> Result<Option<Program>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE program_key = ?1"),
            params![program_key],
            program_from_row,
        )
        .optional()
        .context("reading program")
    }

    fn programs_ingested_since(&self, since: DateTime<Utc>) -> Result<Vec<Program>> {
        let since = ts(&since);
        self.query_programs(
            &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE ingested_at >= ?1"),
            &[&since],
        )
    }

    fn active_programs(&self, kind: Option<ProgramKind>, today: NaiveDate) -> Result<Vec<Program>> {
        let today = today.format("%Y-%m-%d").to_string();
        match kind {
            Some(k) => self.query_programs(
                &format!(
                    "SELECT {PROGRAM_COLUMNS} FROM programs
                     WHERE kind = ?1 AND (apply_end_at IS NULL OR apply_end_at >= ?2)"
                ),
                &[&k.as_str(), &today],
            ),
            None => self.query_programs(
                &format!(
                    "SELECT {PROGRAM_COLUMNS} FROM programs
                     WHERE apply_end_at IS NULL OR apply_end_at >= ?1"
                ),
                &[&today],
            ),
        }
    }

    fn load_profile(&self, seed: &Profile) -> Result<Profile> {
        let conn = self.conn()?;
        let select = "SELECT region_allow, interests, include_keywords, exclude_keywords, \
                      min_score, notify_enabled, notify_time_kst, due_days_threshold \
                      FROM company_profile WHERE id = 1";
        if let Some(p) = conn
            .query_row(select, [], profile_from_row)
            .optional()
            .context("reading profile")?
        {
            return Ok(p);
        }
        drop(conn);
        self.save_profile(seed)?;
        Ok(seed.clone())
    }

    fn save_profile(&self, p: &Profile) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO company_profile (id, region_allow, interests, include_keywords,
                exclude_keywords, min_score, notify_enabled, notify_time_kst, due_days_threshold)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                region_allow = excluded.region_allow, interests = excluded.interests,
                include_keywords = excluded.include_keywords,
                exclude_keywords = excluded.exclude_keywords, min_score = excluded.min_score,
                notify_enabled = excluded.notify_enabled,
                notify_time_kst = excluded.notify_time_kst,
                due_days_threshold = excluded.due_days_threshold",
            params![
                serde_json::to_string(&p.region_allow)?,
                serde_json::to_string(&p.interests)?,
                serde_json::to_string(&p.include_keywords)?,
                serde_json::to_string(&p.exclude_keywords)?,
                p.min_score,
                p.notify_enabled as i64,
                p.notify_time_kst.to_string(),
                p.due_days_threshold,
            ],
        )
        .context("saving profile")?;
        Ok(())
    }

    fn record_action(&self, program_key: &str, action: UserAction, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO user_actions (program_key, action, created_at) VALUES (?1, ?2, ?3)",
            params![program_key, action.as_str(), ts(&at)],
        )
        .context("recording user action")?;
        Ok(())
    }

    fn keys_with_action(&self, action: UserAction) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT program_key FROM user_actions WHERE action = ?1")?;
        let keys = stmt
            .query_map(params![action.as_str()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(keys)
    }

    fn log_ingestion_run(&self, run: &IngestionRun) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ingestion_runs (run_at, kind, fetched_count, new_count, updated_count, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ts(&run.run_at),
                run.kind.as_str(),
                run.fetched_count,
                run.new_count,
                run.updated_count,
                run.error,
            ],
        )
        .context("logging ingestion run")?;
        Ok(())
    }

    fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_at, kind, fetched_count, new_count, updated_count, error
             FROM ingestion_runs ORDER BY run_at DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_row_is_created_from_seed_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let seed = Profile {
            interests: vec!["AI".into()],
            ..Profile::default()
        };
        assert_eq!(store.load_profile(&seed).unwrap(), seed);
        // A different seed later does not overwrite the stored row.
        assert_eq!(store.load_profile(&Profile::default()).unwrap(), seed);
    }

    #[test]
    fn actions_are_unique_per_key_and_action() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        store.record_action("support:1", UserAction::Dismissed, now).unwrap();
        store.record_action("support:1", UserAction::Dismissed, now).unwrap();
        store.record_action("support:1", UserAction::Saved, now).unwrap();
        let dismissed = store.keys_with_action(UserAction::Dismissed).unwrap();
        assert_eq!(dismissed.len(), 1);
        assert!(dismissed.contains("support:1"));
    }
}
