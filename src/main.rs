//! Listing Guard — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

mod api;
mod blocklist;
mod clients;
mod compose;
mod config;
mod error;
mod interpret;
mod metrics;
mod normalize;
mod pipeline;
mod ranking;
mod safety;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::AppState;
use crate::config::AppConfig;
use crate::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - GUARD_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("GUARD_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("listing_guard=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = AppConfig::from_env().expect("Failed to load configuration");

    let prometheus = Metrics::init(cfg.check_concurrency);

    let state = AppState::from_config(&cfg);
    let router = api::router(state).merge(prometheus.router());

    Ok(router.into())
}
