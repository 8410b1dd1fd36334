// tests/metrics_ingest.rs
//
// Ingest series as seen on /metrics. Kept to a single test: the recorder is
// process-global and counters accumulate across tests in one binary.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use bizinfo_recommender::ingest::run_all;
use bizinfo_recommender::ingest::types::{FeedProvider, RawRecord};
use bizinfo_recommender::metrics::Metrics;
use bizinfo_recommender::program::ProgramKind;
use bizinfo_recommender::store::MemoryStore;

struct DownProvider;

#[async_trait]
impl FeedProvider for DownProvider {
    async fn fetch(&self, _kind: ProgramKind) -> Result<Vec<RawRecord>> {
        Err(anyhow!("503 Service Unavailable"))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

fn sample(rendered: &str, name: &str) -> Option<f64> {
    rendered
        .lines()
        .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.trim().parse().ok())
}

#[tokio::test]
async fn each_failed_fetch_counts_once_and_runs_are_described() {
    let metrics = Metrics::init().unwrap();
    let store = MemoryStore::new();

    let runs = run_all(&DownProvider, &store, Utc::now()).await;
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.error.is_some()));

    let out = metrics.render();
    assert_eq!(sample(&out, "ingest_provider_errors_total"), Some(2.0));
    assert_eq!(sample(&out, "ingest_runs_total"), Some(1.0));
    assert!(out.contains("# HELP ingest_runs_total"));
}
