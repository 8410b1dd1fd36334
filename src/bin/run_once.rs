//! One-shot run: ingest both feeds, rank what was just fetched, send the top
//! entries to every configured channel, exit.

use anyhow::Result;
use chrono::Utc;

use bizinfo_recommender::clock::kst;
use bizinfo_recommender::config::AppConfig;
use bizinfo_recommender::digest::{format_list, select_digest};
use bizinfo_recommender::ingest;
use bizinfo_recommender::store::UserAction;
use bizinfo_recommender::{init_tracing, BizinfoClient, DigestMessage, NotifierMux, ProgramStore, SqliteStore};

const TOP_N: usize = 15;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    let store = SqliteStore::open(&cfg.db_path)?;
    let client = BizinfoClient::new(cfg.bizinfo_keys.clone(), cfg.search_cnt)?;

    let now = Utc::now();
    let runs = ingest::run_all(&client, &store, now).await;
    for run in &runs {
        if let Some(err) = &run.error {
            tracing::warn!(kind = %run.kind, error = %err, "ingestion failed");
        }
    }

    let profile = store.load_profile(&cfg.profile_seed)?;
    let fresh = store.programs_ingested_since(now)?;
    let dismissed = store.keys_with_action(UserAction::Dismissed)?;
    let local = now.with_timezone(&kst());
    let top = select_digest(&fresh, &dismissed, &profile, local.date_naive(), TOP_N);

    if top.is_empty() {
        tracing::info!(fetched = fresh.len(), "no recommendations found");
        return Ok(());
    }

    let mux = NotifierMux::from_env();
    if mux.is_empty() {
        tracing::warn!("no notifier configured; nothing sent");
        return Ok(());
    }

    let title = format!("[{}] 업데이트", local.format("%H:%M"));
    let msg = DigestMessage::new(title.clone(), format_list(&title, &top));
    let delivered = mux.notify(&msg).await;
    tracing::info!(items = top.len(), delivered, "run_once finished");
    Ok(())
}
