// src/ingest/normalize.rs
//! Raw feed record → canonical [`Program`].
//!
//! Each target field has an ordered list of candidate source keys; the first
//! present, non-blank value wins. The JSON API and the RSS fallback use
//! different names for the same attribute, so both spellings are listed.

use chrono::{DateTime, Utc};

use super::normalize_text;
use super::types::RawRecord;
use crate::period::parse_period;
use crate::program::{Program, ProgramKind};

/// Detail page used when the record carries no link of its own.
pub const DETAIL_URL_TEMPLATE: &str =
    "https://www.bizinfo.go.kr/web/lay1/bbs/S1T122C128/A/105/view.do?pblancId={seq}";

/// Category assigned to events when the feed leaves it blank.
pub const EVENT_CATEGORY: &str = "행사";

/// Candidate source keys per canonical field, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct FieldKeys {
    pub seq: &'static [&'static str],
    pub title: &'static [&'static str],
    pub summary: &'static [&'static str],
    pub agency: &'static [&'static str],
    pub category: &'static [&'static str],
    pub region: &'static [&'static str],
    pub apply_period: &'static [&'static str],
    pub event_period: &'static [&'static str],
    pub url: &'static [&'static str],
    pub created_at: &'static [&'static str],
    pub updated_at: &'static [&'static str],
}

pub const SUPPORT_KEYS: FieldKeys = FieldKeys {
    seq: &["pblancId", "seq"],
    title: &["pblancNm", "title"],
    summary: &["pblancSumry", "bsnsSumryCn", "pblancCn", "description"],
    agency: &["jrsdInsttNm", "jrsdinstNm", "excInsttNm", "author"],
    category: &["pblancClCd", "pldirSportRealmLclasCodeNm", "lcategory"],
    region: &["jrsdInsttNm", "jrsdinstNm", "areaNm"],
    apply_period: &["reqstBeginEndDe", "reqstDt"],
    event_period: &[],
    url: &["pblancUrl", "link"],
    created_at: &["creatPnttm", "pubDate"],
    updated_at: &["updtPnttm"],
};

pub const EVENT_KEYS: FieldKeys = FieldKeys {
    seq: &["eventId", "eventInfoId", "seq"],
    title: &["eventNm", "nttNm", "title"],
    summary: &["eventCn", "nttCn", "description"],
    agency: &["insttNm", "excInsttNm", "author"],
    category: &["eventClCd", "lcategory"],
    region: &["areaNm"],
    apply_period: &["rceptPd", "rceptPeriod"],
    event_period: &["eventPeriod", "eventBeginEndDt"],
    url: &["eventUrl", "bizinfoUrl", "link"],
    created_at: &["regDate", "creatPnttm", "pubDate"],
    updated_at: &["updtPnttm"],
};

pub fn field_keys(kind: ProgramKind) -> &'static FieldKeys {
    match kind {
        ProgramKind::Support => &SUPPORT_KEYS,
        ProgramKind::Event => &EVENT_KEYS,
    }
}

pub fn fallback_url(seq: &str) -> String {
    DETAIL_URL_TEMPLATE.replace("{seq}", seq)
}

fn text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    raw.first_of(keys)
        .map(normalize_text)
        .filter(|s| !s.is_empty())
}

fn verbatim(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    raw.first_of(keys).map(str::to_string)
}

/// Normalize one record of the given kind. Never fails: absent fields stay `None`.
pub fn normalize(raw: &RawRecord, kind: ProgramKind, ingested_at: DateTime<Utc>) -> Program {
    let keys = field_keys(kind);
    let seq = raw.first_of(keys.seq).unwrap_or_default();

    let mut p = Program::new(kind, seq, ingested_at);
    p.title = text(raw, keys.title);
    p.summary_raw = text(raw, keys.summary);
    p.agency = text(raw, keys.agency);
    p.category_l1 = text(raw, keys.category);
    p.region_raw = text(raw, keys.region);

    p.apply_period_raw = verbatim(raw, keys.apply_period);
    let apply = parse_period(p.apply_period_raw.as_deref());
    p.apply_start_at = apply.start;
    p.apply_end_at = apply.end;

    if kind == ProgramKind::Event {
        p.event_period_raw = verbatim(raw, keys.event_period);
        let ev = parse_period(p.event_period_raw.as_deref());
        p.event_start_at = ev.start;
        p.event_end_at = ev.end;
        if p.category_l1.is_none() {
            p.category_l1 = Some(EVENT_CATEGORY.to_string());
        }
    }

    p.url = Some(
        verbatim(raw, keys.url)
            .map(|u| absolutize(&u))
            .unwrap_or_else(|| fallback_url(seq)),
    );
    p.created_at_source = verbatim(raw, keys.created_at);
    p.updated_at_source = verbatim(raw, keys.updated_at);
    p
}

pub fn normalize_support(raw: &RawRecord, ingested_at: DateTime<Utc>) -> Program {
    normalize(raw, ProgramKind::Support, ingested_at)
}

pub fn normalize_event(raw: &RawRecord, ingested_at: DateTime<Utc>) -> Program {
    normalize(raw, ProgramKind::Event, ingested_at)
}

/// The JSON API returns site-relative detail paths (`/web/lay1/...`).
fn absolutize(url: &str) -> String {
    if url.starts_with('/') {
        format!("https://www.bizinfo.go.kr{url}")
    } else {
        url.to_string()
    }
}
