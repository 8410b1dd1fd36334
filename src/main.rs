//! Bizinfo recommender: binary entrypoint.
//! Boots the Axum HTTP server and the KST ingestion and digest schedulers.
//!
//! See `README.md` for configuration.

use std::sync::Arc;

use bizinfo_recommender::config::AppConfig;
use bizinfo_recommender::ingest::config::load_schedule_default;
use bizinfo_recommender::ingest::scheduler::{spawn_digest_scheduler, spawn_ingest_scheduler};
use bizinfo_recommender::ingest::types::FeedProvider;
use bizinfo_recommender::{app, init_tracing, BizinfoClient, NotifierMux, ProgramStore, SqliteStore};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    let store: Arc<dyn ProgramStore> = Arc::new(SqliteStore::open(&cfg.db_path)?);
    let (router, state) = app(store.clone(), &cfg.profile_seed)?;

    let schedule = load_schedule_default().unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "schedule config unusable, using defaults");
        Default::default()
    });
    let provider: Arc<dyn FeedProvider> =
        Arc::new(BizinfoClient::new(cfg.bizinfo_keys.clone(), cfg.search_cnt)?);
    spawn_ingest_scheduler(provider, store.clone(), schedule);

    let notifier = Arc::new(NotifierMux::from_env());
    spawn_digest_scheduler(store, state.subscribe(), notifier, cfg.digest_limit);

    tracing::info!(db = %cfg.db_path.display(), "bizinfo recommender started");
    Ok(router.into())
}
