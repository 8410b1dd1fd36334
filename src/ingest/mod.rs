// src/ingest/mod.rs
pub mod config;
pub mod normalize;
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::FeedProvider;
use crate::program::ProgramKind;
use crate::store::{IngestionRun, ProgramStore, UpsertOutcome};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetched_total", "Raw records returned by the feed.");
        describe_counter!("ingest_new_total", "Programs inserted for the first time.");
        describe_counter!("ingest_updated_total", "Programs overwritten by a later fetch.");
        describe_counter!(
            "ingest_record_errors_total",
            "Records skipped because storing them failed."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed fetch/parse errors."
        );
        describe_counter!("ingest_runs_total", "Ingestion passes over every kind.");
        describe_histogram!("ingest_fetch_ms", "Feed fetch time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingestion last ran.");
    });
}

/// Normalize feed text: strip tags, decode entities, collapse whitespace, trim.
/// Tags go first so escaped brackets (`&lt;공고&gt;`) survive as text.
/// Length is not capped.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("valid tag regex"));
    let stripped = re_tags.replace_all(s, " ");
    let mut out = html_escape::decode_html_entities(&stripped).to_string();

    // “ ” ‘ ’ → ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("valid ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();
    out
}

/// Fetch one kind, normalize every record and upsert it. Always returns (and
/// logs) an audit row; a fetch failure ends up in `error`, a single bad record
/// is skipped.
pub async fn run_kind(
    provider: &dyn FeedProvider,
    store: &dyn ProgramStore,
    kind: ProgramKind,
    now: DateTime<Utc>,
) -> IngestionRun {
    ensure_metrics_described();
    let mut run = IngestionRun::started(kind, now);

    let t0 = std::time::Instant::now();
    let fetched = provider.fetch(kind).await;
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match fetched {
        Ok(records) => {
            run.fetched_count = records.len() as u32;
            counter!("ingest_fetched_total").increment(records.len() as u64);

            for raw in &records {
                let program = normalize::normalize(raw, kind, now);
                match store.upsert_program(&program) {
                    Ok(UpsertOutcome::Inserted) => run.new_count += 1,
                    Ok(UpsertOutcome::Updated) => run.updated_count += 1,
                    Err(e) => {
                        tracing::warn!(error = ?e, key = %program.program_key, "record skipped");
                        counter!("ingest_record_errors_total").increment(1);
                    }
                }
            }
            counter!("ingest_new_total").increment(run.new_count as u64);
            counter!("ingest_updated_total").increment(run.updated_count as u64);
        }
        Err(e) => {
            tracing::warn!(error = ?e, provider = provider.name(), %kind, "provider error");
            counter!("ingest_provider_errors_total").increment(1);
            run.error = Some(format!("{e:#}"));
        }
    }

    if let Err(e) = store.log_ingestion_run(&run) {
        tracing::error!(error = ?e, %kind, "failed to log ingestion run");
    }
    gauge!("ingest_last_run_ts").set(now.timestamp() as f64);

    tracing::info!(
        target: "ingest",
        %kind,
        fetched = run.fetched_count,
        new = run.new_count,
        updated = run.updated_count,
        error = run.error.as_deref().unwrap_or(""),
        "ingestion run finished"
    );
    run
}

/// Ingest every kind in order (support, then event).
pub async fn run_all(
    provider: &dyn FeedProvider,
    store: &dyn ProgramStore,
    now: DateTime<Utc>,
) -> Vec<IngestionRun> {
    let mut runs = Vec::with_capacity(ProgramKind::ALL.len());
    for kind in ProgramKind::ALL {
        runs.push(run_kind(provider, store, kind, now).await);
    }
    counter!("ingest_runs_total").increment(1);
    runs
}
