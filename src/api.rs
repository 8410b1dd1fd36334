// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{watch, Mutex};
use tower_http::cors::CorsLayer;

use crate::action_token;
use crate::clock::kst_today;
use crate::digest::{self, format_list, LimitParam, ListQuery};
use crate::metrics::Metrics;
use crate::profile::{Profile, ProfileUpdate};
use crate::program::ProgramKind;
use crate::recommend::ScoredCandidate;
use crate::store::{IngestionRun, ProgramStore, UserAction};

const RECENT_RUNS: usize = 5;

/// Shared handler state. The profile lives in a watch channel so the digest
/// scheduler sees every change. Writers hold `profile_write` across
/// read, persist and publish.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgramStore>,
    pub profile: Arc<watch::Sender<Profile>>,
    pub metrics: Option<Metrics>,
    profile_write: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProgramStore>, profile: Profile) -> Self {
        let (tx, _rx) = watch::channel(profile);
        Self {
            store,
            profile: Arc::new(tx),
            metrics: None,
            profile_write: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Profile> {
        self.profile.subscribe()
    }

    pub fn current_profile(&self) -> Profile {
        self.profile.borrow().clone()
    }

    /// Derive the next profile from the current one, persist it, then publish.
    /// Concurrent updates are applied one after another.
    pub async fn update_profile<F>(&self, f: F) -> anyhow::Result<Profile>
    where
        F: FnOnce(Profile) -> Profile,
    {
        let _guard = self.profile_write.lock().await;
        let next = f(self.current_profile());
        self.store.save_profile(&next)?;
        self.profile.send_replace(next.clone());
        Ok(next)
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn create_router(state: AppState) -> Router {
    let metrics_routes = state
        .metrics
        .as_ref()
        .map(|m| m.router::<AppState>())
        .unwrap_or_default();

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/runs", get(runs))
        .route("/profile", get(get_profile).put(put_profile))
        .route("/mute", post(mute))
        .route("/unmute", post(unmute))
        .route("/digest", get(list_all))
        .route("/support", get(list_support))
        .route("/events", get(list_events))
        .route("/due", get(due_all))
        .route("/due/support", get(due_support))
        .route("/due/events", get(due_events))
        .route("/actions/{action}/{token}", post(record_action))
        .merge(metrics_routes)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn runs(State(state): State<AppState>) -> ApiResult<Vec<IngestionRun>> {
    Ok(Json(state.store.recent_runs(RECENT_RUNS)?))
}

async fn get_profile(State(state): State<AppState>) -> Json<Profile> {
    Json(state.current_profile())
}

async fn put_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    let next = state.update_profile(|current| current.apply(update)).await?;
    tracing::info!(profile = ?next, "profile updated");
    Ok(Json(next))
}

async fn set_notify(state: &AppState, enabled: bool) -> ApiResult<Profile> {
    let next = state
        .update_profile(|current| Profile {
            notify_enabled: enabled,
            ..current
        })
        .await?;
    Ok(Json(next))
}

async fn mute(State(state): State<AppState>) -> ApiResult<Profile> {
    set_notify(&state, false).await
}

async fn unmute(State(state): State<AppState>) -> ApiResult<Profile> {
    set_notify(&state, true).await
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub title: String,
    pub items: Vec<ScoredCandidate>,
    /// Same list rendered as chat text.
    pub text: String,
}

fn run_listing(state: &AppState, query: ListQuery) -> ApiResult<ListResponse> {
    let profile = state.current_profile();
    let items = digest::listing(state.store.as_ref(), &profile, kst_today(), query)?;
    let title = query.title();
    let text = format_list(&title, &items);
    Ok(Json(ListResponse { title, items, text }))
}

async fn list_all(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::all().with_limit(q.limit))
}

async fn list_support(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::of_kind(ProgramKind::Support).with_limit(q.limit))
}

async fn list_events(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::of_kind(ProgramKind::Event).with_limit(q.limit))
}

async fn due_all(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::due(None).with_limit(q.limit))
}

async fn due_support(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::due(Some(ProgramKind::Support)).with_limit(q.limit))
}

async fn due_events(State(s): State<AppState>, Query(q): Query<LimitParam>) -> ApiResult<ListResponse> {
    run_listing(&s, ListQuery::due(Some(ProgramKind::Event)).with_limit(q.limit))
}

#[derive(Debug, Serialize)]
struct ActionOut {
    action: UserAction,
    program_key: String,
}

async fn record_action(
    State(state): State<AppState>,
    Path((action, token)): Path<(String, String)>,
) -> ApiResult<ActionOut> {
    let action: UserAction = action
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
    let program_key =
        action_token::decode(&token).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.store.record_action(&program_key, action, Utc::now())?;
    tracing::info!(%action, key = %program_key, "user action recorded");
    Ok(Json(ActionOut {
        action,
        program_key,
    }))
}
