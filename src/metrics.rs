// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. The recorder is process-global, so a
    /// second call returns the handle from the first.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")
            })?
            .clone();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let metrics = self.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let m = metrics.clone();
                async move { m.render() }
            }),
        )
    }
}
