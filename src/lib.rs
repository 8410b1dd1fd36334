// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod action_token;
pub mod api;
pub mod clock;
pub mod config;
pub mod digest;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod period;
pub mod profile;
pub mod program;
pub mod recommend;
pub mod store;

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use crate::api::{create_router, AppState};
pub use crate::ingest::providers::BizinfoClient;
pub use crate::notify::{DigestMessage, NotifierMux};
pub use crate::profile::Profile;
pub use crate::program::{Program, ProgramKind};
pub use crate::store::{MemoryStore, ProgramStore, SqliteStore};

/// Compact logs filtered by `RUST_LOG` (default `info`). A second call, or a
/// subscriber already installed by the runtime, is left alone.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Router plus state over `store`. The stored profile wins over `seed`, which
/// is only written on first use.
pub fn app(store: Arc<dyn ProgramStore>, seed: &Profile) -> Result<(axum::Router, AppState)> {
    let profile = store.load_profile(seed)?;
    let state = AppState::new(store, profile).with_metrics(metrics::Metrics::init()?);
    Ok((create_router(state.clone()), state))
}
