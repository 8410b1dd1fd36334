// src/profile.rs
//! Subscriber interest profile (single row) plus its validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default region; region never filters, so this only documents intent.
pub const NATIONWIDE: &str = "전국";

pub const DEFAULT_MIN_SCORE: i32 = 60;
pub const DEFAULT_DUE_DAYS_THRESHOLD: i64 = 7;

/// Wall-clock time of day in KST, `HH:MM`. Used for the digest and ingestion schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KstTime {
    pub hour: u32,
    pub minute: u32,
}

impl KstTime {
    pub const DEFAULT: KstTime = KstTime { hour: 8, minute: 30 };

    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.trim().split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Lenient variant used for user input: anything unparsable becomes 08:30.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::DEFAULT)
    }
}

impl Default for KstTime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for KstTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for KstTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid HH:MM time: {value}"))
    }
}

impl From<KstTime> for String {
    fn from(value: KstTime) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub region_allow: Vec<String>,
    pub interests: Vec<String>,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub min_score: i32,
    pub due_days_threshold: i64,
    pub notify_enabled: bool,
    pub notify_time_kst: KstTime,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            region_allow: vec![NATIONWIDE.to_string()],
            interests: Vec::new(),
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            min_score: DEFAULT_MIN_SCORE,
            due_days_threshold: DEFAULT_DUE_DAYS_THRESHOLD,
            notify_enabled: true,
            notify_time_kst: KstTime::DEFAULT,
        }
    }
}

impl Profile {
    /// Bring every field into its valid range. Idempotent.
    pub fn sanitized(mut self) -> Self {
        self.region_allow = clean_list(self.region_allow);
        self.interests = clean_list(self.interests);
        self.include_keywords = clean_list(self.include_keywords);
        self.exclude_keywords = clean_list(self.exclude_keywords);
        self.min_score = self.min_score.clamp(0, 100);
        self.due_days_threshold = self.due_days_threshold.max(0);
        self
    }

    pub fn apply(&self, update: ProfileUpdate) -> Profile {
        let mut next = self.clone();
        if let Some(v) = update.region_allow {
            next.region_allow = v;
        }
        if let Some(v) = update.interests {
            next.interests = v;
        }
        if let Some(v) = update.include_keywords {
            next.include_keywords = v;
        }
        if let Some(v) = update.exclude_keywords {
            next.exclude_keywords = v;
        }
        if let Some(v) = update.min_score {
            next.min_score = v;
        }
        if let Some(v) = update.due_days_threshold {
            next.due_days_threshold = v;
        }
        if let Some(v) = update.notify_enabled {
            next.notify_enabled = v;
        }
        if let Some(v) = update.notify_time_kst {
            next.notify_time_kst = KstTime::parse_or_default(&v);
        }
        next.sanitized()
    }

    /// Human-readable summary for the profile command.
    pub fn describe(&self) -> String {
        format!(
            "👤 프로필 설정\n\n허용지역: {}\n관심분야: {}\n포함키워드: {}\n제외키워드: {}\n최소점수: {}\n알림: {} ({})\n마감임박: D-{}\n",
            self.region_allow.join(", "),
            self.interests.join(", "),
            self.include_keywords.join(", "),
            self.exclude_keywords.join(", "),
            self.min_score,
            if self.notify_enabled { "ON" } else { "OFF" },
            self.notify_time_kst,
            self.due_days_threshold,
        )
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub region_allow: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub include_keywords: Option<Vec<String>>,
    pub exclude_keywords: Option<Vec<String>>,
    pub min_score: Option<i32>,
    pub due_days_threshold: Option<i64>,
    pub notify_enabled: Option<bool>,
    pub notify_time_kst: Option<String>,
}

/// Trim, drop blanks, drop case-insensitive duplicates; first spelling wins.
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() {
            continue;
        }
        if seen.insert(t.to_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}

/// Accepts a JSON array (`["AI","수출"]`) or a comma list (`AI, 수출`).
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Ok(v) = serde_json::from_str::<Vec<String>>(trimmed) {
        return clean_list(v);
    }
    clean_list(trimmed.split(',').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_time_round_trips_through_display() {
        let t = KstTime::parse("7:05").unwrap();
        assert_eq!(t.to_string(), "07:05");
        assert_eq!(KstTime::parse("24:00"), None);
        assert_eq!(KstTime::parse_or_default("soon"), KstTime::DEFAULT);
    }

    #[test]
    fn apply_sanitizes_lists_and_score() {
        let p = Profile::default().apply(ProfileUpdate {
            interests: Some(vec![" AI ".into(), "ai".into(), "".into(), "수출".into()]),
            min_score: Some(250),
            notify_time_kst: Some("nope".into()),
            ..Default::default()
        });
        assert_eq!(p.interests, vec!["AI".to_string(), "수출".to_string()]);
        assert_eq!(p.min_score, 100);
        assert_eq!(p.notify_time_kst, KstTime::DEFAULT);
        assert_eq!(p.region_allow, vec![NATIONWIDE.to_string()]);
    }

    #[test]
    fn parse_list_accepts_json_and_commas() {
        assert_eq!(parse_list(r#"["서울", "경기"]"#), vec!["서울", "경기"]);
        assert_eq!(parse_list("서울, 경기,,"), vec!["서울", "경기"]);
        assert!(parse_list("  ").is_empty());
    }
}
