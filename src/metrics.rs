use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and expose a static gauge for the
    /// configured fan-out bound. Counters (`phrase_checks_total`,
    /// `blocklist_hits_total`, `lookup_blocks_total`,
    /// `lookup_call_failures_total`, `fallback_topups_total`,
    /// `widen_events_total`, `ranking_failures_total`) are registered
    /// lazily at their call sites.
    pub fn init(check_concurrency: usize) -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        gauge!("check_concurrency_limit").set(check_concurrency as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
