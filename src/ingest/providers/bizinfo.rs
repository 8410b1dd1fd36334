// src/ingest/providers/bizinfo.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;

use crate::ingest::types::{FeedProvider, RawRecord};
use crate::program::ProgramKind;

pub const SUPPORT_API_URL: &str = "https://www.bizinfo.go.kr/uss/rss/bizinfoApi.do";
pub const EVENT_API_URL: &str = "https://www.bizinfo.go.kr/uss/rss/bizinfoEventApi.do";
pub const DEFAULT_SEARCH_CNT: u32 = 100;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-kind API keys. A missing key disables that feed.
#[derive(Debug, Clone, Default)]
pub struct BizinfoKeys {
    pub support: Option<String>,
    pub event: Option<String>,
}

impl BizinfoKeys {
    fn for_kind(&self, kind: ProgramKind) -> Option<&str> {
        match kind {
            ProgramKind::Support => self.support.as_deref(),
            ProgramKind::Event => self.event.as_deref(),
        }
        .map(str::trim)
        .filter(|k| !k.is_empty())
    }
}

pub struct BizinfoClient {
    mode: Mode,
}

enum Mode {
    /// Canned response bodies per kind, no network.
    Fixture { support: String, event: String },
    Http {
        keys: BizinfoKeys,
        search_cnt: u32,
        client: reqwest::Client,
    },
}

impl BizinfoClient {
    pub fn new(keys: BizinfoKeys, search_cnt: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("building bizinfo http client")?;
        Ok(Self {
            mode: Mode::Http {
                keys,
                search_cnt,
                client,
            },
        })
    }

    pub fn from_fixtures(support_body: &str, event_body: &str) -> Self {
        Self {
            mode: Mode::Fixture {
                support: support_body.to_string(),
                event: event_body.to_string(),
            },
        }
    }

    pub fn endpoint(kind: ProgramKind) -> &'static str {
        match kind {
            ProgramKind::Support => SUPPORT_API_URL,
            ProgramKind::Event => EVENT_API_URL,
        }
    }

    async fn fetch_http(
        client: &reqwest::Client,
        kind: ProgramKind,
        key: &str,
        search_cnt: u32,
    ) -> Result<Vec<RawRecord>> {
        let url = Self::endpoint(kind);
        let cnt = search_cnt.to_string();

        let json_attempt = async {
            let body = client
                .get(url)
                .query(&[("crtfcKey", key), ("dataType", "json"), ("searchCnt", cnt.as_str())])
                .send()
                .await
                .context("bizinfo json get()")?
                .error_for_status()
                .context("bizinfo json non-2xx")?
                .text()
                .await
                .context("bizinfo json .text()")?;
            Ok::<_, anyhow::Error>(body)
        };
        match json_attempt.await {
            Ok(body) => match parse_json_items(&body) {
                Some(items) if !items.is_empty() => return Ok(items),
                Some(_) => tracing::info!(%kind, "empty jsonArray, trying XML"),
                None => tracing::info!(%kind, "JSON decode failed, trying XML"),
            },
            Err(e) => tracing::warn!(error = ?e, %kind, "bizinfo JSON request failed"),
        }

        let body = client
            .get(url)
            .query(&[("crtfcKey", key), ("searchCnt", cnt.as_str())])
            .send()
            .await
            .context("bizinfo xml get()")?
            .error_for_status()
            .context("bizinfo xml non-2xx")?
            .text()
            .await
            .context("bizinfo xml .text()")?;
        parse_rss_items(&body)
    }
}

#[async_trait]
impl FeedProvider for BizinfoClient {
    async fn fetch(&self, kind: ProgramKind) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture { support, event } => {
                let body = match kind {
                    ProgramKind::Support => support,
                    ProgramKind::Event => event,
                };
                parse_body(body)
            }
            Mode::Http {
                keys,
                search_cnt,
                client,
            } => {
                let Some(key) = keys.for_kind(kind) else {
                    tracing::warn!(%kind, url = Self::endpoint(kind), "API key not provided");
                    return Ok(Vec::new());
                };
                Self::fetch_http(client, kind, key, *search_cnt).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "bizinfo"
    }
}

/// Parse a response body of either shape: JSON when it decodes, otherwise XML.
pub fn parse_body(body: &str) -> Result<Vec<RawRecord>> {
    match parse_json_items(body) {
        Some(items) => Ok(items),
        None => parse_rss_items(body),
    }
}

/// `{"jsonArray": [...]}` → records. `None` when the body is not JSON at all.
/// A single object in place of the array is accepted as one record.
pub fn parse_json_items(body: &str) -> Option<Vec<RawRecord>> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let items = match v.get("jsonArray") {
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|it| it.as_object())
            .map(RawRecord::from_json_object)
            .collect(),
        Some(serde_json::Value::Object(obj)) => vec![RawRecord::from_json_object(obj)],
        _ => Vec::new(),
    };
    Some(items)
}

/// `rss/channel/item` → one record per item, child element name → text.
/// Nested elements inside a field are flattened into that field's text.
pub fn parse_rss_items(xml: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    let mut current: Option<RawRecord> = None;
    let mut field: Option<String> = None;
    let mut nested = 0usize;
    let mut buf = String::new();

    loop {
        match reader.read_event().context("parsing bizinfo rss xml")? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if current.is_none() {
                    if name == "item" {
                        current = Some(RawRecord::new());
                    }
                } else if field.is_none() {
                    field = Some(name);
                    buf.clear();
                } else {
                    nested += 1;
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    push_text(&mut buf, &text);
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    push_text(&mut buf, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if nested > 0 {
                    nested -= 1;
                } else if let Some(f) = field.take() {
                    if let Some(rec) = current.as_mut() {
                        rec.insert(f, std::mem::take(&mut buf));
                    }
                } else if name.as_ref() == b"item" {
                    if let Some(rec) = current.take() {
                        out.push(rec);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn push_text(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array_is_preferred() {
        let body = r#"{"jsonArray":[{"pblancId":"PBLN_1","pblancNm":"A"},{"pblancId":"PBLN_2"}]}"#;
        let items = parse_body(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("pblancNm"), Some("A"));
    }

    #[test]
    fn single_rss_item_becomes_one_record() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>기업마당</title>
<item><title><![CDATA[수출 바우처]]></title><seq>PBLN_9</seq><link>https://x/y?a=1&amp;b=2</link></item>
</channel></rss>"#;
        let items = parse_rss_items(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("title"), Some("수출 바우처"));
        assert_eq!(items[0].get("link"), Some("https://x/y?a=1&b=2"));
        assert_eq!(items[0].get("seq"), Some("PBLN_9"));
    }

    #[test]
    fn channel_without_items_is_empty() {
        let xml = "<rss><channel><title>t</title></channel></rss>";
        assert!(parse_rss_items(xml).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_key_yields_empty_list() {
        let client = BizinfoClient::new(BizinfoKeys::default(), DEFAULT_SEARCH_CNT).unwrap();
        let items = client.fetch(ProgramKind::Support).await.unwrap();
        assert!(items.is_empty());
    }
}
