// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::KstTime;

const ENV_PATH: &str = "SCHEDULE_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/schedule.toml";

/// When ingestion runs, in KST. Both kinds are fetched at every time listed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_ingest_times")]
    pub ingest_times: Vec<KstTime>,
}

fn default_ingest_times() -> Vec<KstTime> {
    vec![KstTime { hour: 8, minute: 0 }, KstTime { hour: 18, minute: 0 }]
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ingest_times: default_ingest_times(),
        }
    }
}

impl ScheduleConfig {
    /// Sorted, duplicates removed; an empty list falls back to the defaults.
    fn cleaned(mut self) -> Self {
        self.ingest_times.sort_by_key(|t| (t.hour, t.minute));
        self.ingest_times.dedup();
        if self.ingest_times.is_empty() {
            self.ingest_times = default_ingest_times();
        }
        self
    }
}

pub fn load_schedule_from(path: &Path) -> Result<ScheduleConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading schedule from {}", path.display()))?;
    parse_schedule(&content)
}

/// Load schedule using env var + fallbacks:
/// 1) $SCHEDULE_CONFIG_PATH
/// 2) config/schedule.toml
/// 3) built-in 08:00 and 18:00
pub fn load_schedule_default() -> Result<ScheduleConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_schedule_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_PATH);
    if toml_p.exists() {
        return load_schedule_from(&toml_p);
    }
    Ok(ScheduleConfig::default())
}

fn parse_schedule(s: &str) -> Result<ScheduleConfig> {
    let cfg: ScheduleConfig = toml::from_str(s).context("parsing schedule toml")?;
    Ok(cfg.cleaned())
}
