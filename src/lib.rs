// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod blocklist;
pub mod clients;
pub mod compose;
pub mod config;
pub mod error;
pub mod interpret;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod ranking;
pub mod safety;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::pipeline::EmptySafePolicy;
pub use crate::safety::{PhraseDecision, SafetyChecker};
