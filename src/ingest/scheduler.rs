// src/ingest/scheduler.rs
//! Wall-clock jobs in KST: ingestion at the configured times, and the daily
//! digest at the profile's delivery time.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::{kst, kst_to_utc};
use crate::digest::{self, format_list};
use crate::ingest::config::ScheduleConfig;
use crate::ingest::types::FeedProvider;
use crate::notify::{DigestMessage, NotifierMux};
use crate::profile::{KstTime, Profile};
use crate::store::ProgramStore;

pub const DIGEST_TITLE: &str = "일일 추천";

/// Next instant strictly after `now` at which KST wall-clock reads `at`.
pub fn next_fire(now: DateTime<Utc>, at: KstTime) -> DateTime<Utc> {
    let local_date = now.with_timezone(&kst()).date_naive();
    let time = NaiveTime::from_hms_opt(at.hour, at.minute, 0).unwrap_or(NaiveTime::MIN);
    let today = kst_to_utc(local_date.and_time(time));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Earliest upcoming fire time among `times`.
pub fn next_of(now: DateTime<Utc>, times: &[KstTime]) -> Option<DateTime<Utc>> {
    times.iter().map(|t| next_fire(now, *t)).min()
}

fn until(target: DateTime<Utc>) -> std::time::Duration {
    (target - Utc::now()).to_std().unwrap_or_default()
}

pub fn spawn_ingest_scheduler(
    provider: Arc<dyn FeedProvider>,
    store: Arc<dyn ProgramStore>,
    cfg: ScheduleConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(next) = next_of(Utc::now(), &cfg.ingest_times) else {
                tracing::warn!("no ingestion times configured; ingest scheduler stopped");
                return;
            };
            tracing::info!(target: "ingest", next = %next.with_timezone(&kst()), "next ingestion scheduled");
            tokio::time::sleep(until(next)).await;

            let runs = crate::ingest::run_all(provider.as_ref(), store.as_ref(), Utc::now()).await;
            tracing::info!(
                target: "ingest",
                runs = runs.len(),
                failed = runs.iter().filter(|r| r.error.is_some()).count(),
                "scheduled ingestion tick"
            );
        }
    })
}

/// Build and send one digest. Returns the number of programs included; nothing
/// is sent when there is nothing to recommend.
pub async fn run_digest(
    store: &dyn ProgramStore,
    profile: &Profile,
    notifier: &NotifierMux,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<usize> {
    let today = now.with_timezone(&kst()).date_naive();
    let top = digest::digest(store, profile, now, today, limit)?;
    if top.is_empty() {
        tracing::info!("digest: nothing to recommend");
        return Ok(0);
    }
    let msg = DigestMessage::new(DIGEST_TITLE, format_list(DIGEST_TITLE, &top));
    let delivered = notifier.notify(&msg).await;
    tracing::info!(items = top.len(), delivered, "digest sent");
    Ok(top.len())
}

/// Digest loop. The next fire time is re-derived from the current profile
/// snapshot whenever the profile changes (mute, unmute, new time).
pub fn spawn_digest_scheduler(
    store: Arc<dyn ProgramStore>,
    mut profile_rx: watch::Receiver<Profile>,
    notifier: Arc<NotifierMux>,
    limit: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let profile = profile_rx.borrow_and_update().clone();

            if !profile.notify_enabled {
                tracing::info!("digest muted; waiting for profile change");
                if profile_rx.changed().await.is_err() {
                    return;
                }
                continue;
            }

            let next = next_fire(Utc::now(), profile.notify_time_kst);
            tracing::info!(next = %next.with_timezone(&kst()), "next digest scheduled");

            tokio::select! {
                _ = tokio::time::sleep(until(next)) => {
                    if let Err(e) = run_digest(store.as_ref(), &profile, &notifier, Utc::now(), limit).await {
                        tracing::error!(error = ?e, "digest job failed");
                    }
                }
                changed = profile_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    tracing::info!("profile changed; rescheduling digest");
                }
            }
        }
    })
}
