// src/config.rs
//! Process configuration from the environment (`.env` is loaded by the binaries).

use std::env;
use std::path::PathBuf;

use crate::ingest::providers::bizinfo::{BizinfoKeys, DEFAULT_SEARCH_CNT};
use crate::profile::{parse_list, Profile};
use crate::store::sqlite::DEFAULT_DB_PATH;

pub const DEFAULT_DIGEST_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bizinfo_keys: BizinfoKeys,
    pub search_cnt: u32,
    pub digest_limit: usize,
    pub profile_seed: Profile,
}

/// Set and non-blank, trimmed.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_opt(key) {
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "unparsable value, using default");
            default
        }),
        None => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: env_opt("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            bizinfo_keys: BizinfoKeys {
                support: env_opt("BIZINFO_SUPPORT_KEY"),
                event: env_opt("BIZINFO_EVENT_KEY"),
            },
            search_cnt: env_parse("BIZINFO_SEARCH_CNT", DEFAULT_SEARCH_CNT),
            digest_limit: env_parse("DIGEST_LIMIT", DEFAULT_DIGEST_LIMIT),
            profile_seed: profile_seed_from_env(),
        }
    }
}

/// Profile used the first time the store has none. Blank values keep defaults.
pub fn profile_seed_from_env() -> Profile {
    let mut p = Profile::default();
    if let Some(v) = env_opt("PROFILE_REGIONS") {
        p.region_allow = parse_list(&v);
    }
    if let Some(v) = env_opt("PROFILE_INTERESTS") {
        p.interests = parse_list(&v);
    }
    if let Some(v) = env_opt("PROFILE_KEYWORDS") {
        p.include_keywords = parse_list(&v);
    }
    if let Some(v) = env_opt("PROFILE_EXCLUDES") {
        p.exclude_keywords = parse_list(&v);
    }
    p.min_score = env_parse("PROFILE_MIN_SCORE", p.min_score);
    p.sanitized()
}
