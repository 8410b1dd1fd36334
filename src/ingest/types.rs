// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::program::ProgramKind;

/// One feed item as delivered: arbitrary keys, string values.
/// Key names differ between the JSON and RSS shapes of the same feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, String>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Present and non-blank value for `key`, trimmed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First present, non-blank value among `keys`, in priority order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scalars are kept (numbers/bools stringified); null, arrays and objects are dropped.
    pub fn from_json_object(obj: &serde_json::Map<String, serde_json::Value>) -> Self {
        use serde_json::Value;
        let mut out = Self::new();
        for (k, v) in obj {
            match v {
                Value::String(s) => out.insert(k.as_str(), s.as_str()),
                Value::Number(n) => out.insert(k.as_str(), n.to_string()),
                Value::Bool(b) => out.insert(k.as_str(), b.to_string()),
                Value::Null | Value::Array(_) | Value::Object(_) => {}
            }
        }
        out
    }
}

impl From<BTreeMap<String, String>> for RawRecord {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self(value)
    }
}

/// Fetch side of ingestion. Implementations may fail; the orchestrator absorbs
/// the error and records it on the run.
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, kind: ProgramKind) -> Result<Vec<RawRecord>>;
    fn name(&self) -> &'static str;
}
