// src/config.rs
//! Process-wide configuration, resolved once at startup and injected into
//! the components that need it. No component reads the environment after
//! boot; tests construct an `AppConfig` by hand.

use std::env;
use std::time::Duration;

pub const DEFAULT_GEN_MODEL_ID: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_EMB_MODEL_ID: &str = "text-embedding-004";

/// Hard cap on concurrent outbound lookup calls in the batch fan-out.
pub const DEFAULT_CHECK_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Key for the generative + embedding collaborator.
    pub google_api_key: String,
    /// Key for the RapidAPI trademark-lookup collaborator.
    pub rapidapi_key: String,
    pub gen_model_id: String,
    pub emb_model_id: String,
    /// Total per-call budget for the trademark lookup.
    pub lookup_timeout: Duration,
    /// Per-call budget for generation and embedding calls.
    pub model_timeout: Duration,
    /// Bound on concurrent per-phrase lookup checks.
    pub check_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: String::new(),
            rapidapi_key: String::new(),
            gen_model_id: DEFAULT_GEN_MODEL_ID.to_string(),
            emb_model_id: DEFAULT_EMB_MODEL_ID.to_string(),
            lookup_timeout: Duration::from_secs(5),
            model_timeout: Duration::from_secs(10),
            check_concurrency: DEFAULT_CHECK_CONCURRENCY,
        }
    }
}

impl AppConfig {
    /// Resolve from the environment. Keys are required; everything else has
    /// a sane default. `RAPIDAPI_KEY` and `X_RAPIDAPI_KEY` are both accepted
    /// since deployments have used either name.
    pub fn from_env() -> anyhow::Result<Self> {
        let google_api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| anyhow::anyhow!("Missing GOOGLE_API_KEY env var"))?;
        let rapidapi_key = env::var("RAPIDAPI_KEY")
            .or_else(|_| env::var("X_RAPIDAPI_KEY"))
            .map_err(|_| anyhow::anyhow!("Missing RAPIDAPI_KEY (RapidAPI trademark lookup)"))?;

        let mut cfg = Self {
            google_api_key,
            rapidapi_key,
            ..Self::default()
        };

        if let Ok(m) = env::var("GEN_MODEL_ID") {
            if !m.trim().is_empty() {
                cfg.gen_model_id = m.trim().to_string();
            }
        }
        if let Ok(m) = env::var("EMB_MODEL_ID") {
            if !m.trim().is_empty() {
                cfg.emb_model_id = m.trim().to_string();
            }
        }
        if let Some(n) = env::var("CHECK_CONCURRENCY")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
        {
            // clamp: zero would deadlock the semaphore, huge is pointless
            cfg.check_concurrency = n.clamp(1, 64);
        }

        Ok(cfg)
    }
}
