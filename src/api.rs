use std::sync::Arc;

use shuttle_axum::axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::blocklist::Blocklist;
use crate::clients::trademark::RAPIDAPI_HOST;
use crate::clients::{GeminiEmbedder, GeminiGenerator, RapidApiTrademarkClient};
use crate::compose::{Composer, LabeledPhrase};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::normalize;
use crate::pipeline::{self, EmptySafePolicy};
use crate::ranking::{RankOptions, RelevanceRanker};
use crate::safety::{PhraseDecision, SafetyChecker};

#[derive(Clone)]
pub struct AppState {
    pub checker: SafetyChecker,
    pub ranker: RelevanceRanker,
    pub composer: Arc<Composer>,
    pub blocklist: Arc<Blocklist>,
}

impl AppState {
    pub fn new(
        checker: SafetyChecker,
        ranker: RelevanceRanker,
        composer: Arc<Composer>,
        blocklist: Arc<Blocklist>,
    ) -> Self {
        Self {
            checker,
            ranker,
            composer,
            blocklist,
        }
    }

    /// Wire the production collaborators from config.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let blocklist = Arc::new(Blocklist::from_config());
        let lookup = Arc::new(RapidApiTrademarkClient::new(cfg));
        let embedder = Arc::new(GeminiEmbedder::new(cfg));
        let generator = Arc::new(GeminiGenerator::new(cfg));

        Self {
            checker: SafetyChecker::new(
                Arc::clone(&blocklist),
                lookup,
                cfg.check_concurrency,
            ),
            ranker: RelevanceRanker::new(embedder),
            composer: Arc::new(Composer::new(generator, Arc::clone(&blocklist))),
            blocklist,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/tmcheck/v1/verify", post(verify_phrases))
        .route("/ranking/rank", post(rank_phrases))
        .route("/tags/generate", post(generate_tags))
        .route("/compose/all", post(compose_all))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---- /tmcheck/v1/verify ----

fn default_min_safe() -> usize {
    8
}

#[derive(serde::Deserialize)]
pub struct VerifyRequest {
    /// Up to 50 candidate tags/phrases.
    pub phrases: Vec<String>,
    /// Nice class code, e.g. 25. Reserved; echoed in meta.
    #[serde(default)]
    pub nice_class: Option<u16>,
    /// Minimum safe phrases to return (1..=50).
    #[serde(default = "default_min_safe")]
    pub min_safe: usize,
    /// Fallback safe-ish generics for the top-up.
    #[serde(default)]
    pub fallback_defaults: Vec<String>,
}

#[derive(serde::Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub safe: Vec<String>,
    pub blocked: Vec<PhraseDecision>,
    pub meta: VerifyMeta,
}

#[derive(serde::Serialize)]
pub struct VerifyMeta {
    pub checked: usize,
    pub safe_count: usize,
    pub min_safe_required: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice_class: Option<u16>,
    pub api: &'static str,
}

async fn verify_phrases(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    if !(1..=50).contains(&req.min_safe) {
        return Err(ApiError::InvalidInput(format!(
            "min_safe must be between 1 and 50, got {}",
            req.min_safe
        )));
    }
    let phrases = normalize::normalize_required(&req.phrases, Some(normalize::VERIFY_CAP))?;

    // Caller-supplied fallbacks first, operator defaults behind them.
    let mut fallbacks = req.fallback_defaults.clone();
    fallbacks.extend(state.blocklist.fallback_defaults().iter().cloned());

    let outcome = pipeline::filter_candidates(
        &state.checker,
        &phrases,
        req.nice_class,
        req.min_safe,
        &fallbacks,
        EmptySafePolicy::ReturnEmpty,
    )
    .await;

    Ok(Json(VerifyResponse {
        ok: true,
        meta: VerifyMeta {
            checked: phrases.len(),
            safe_count: outcome.safe.len(),
            min_safe_required: req.min_safe,
            nice_class: req.nice_class,
            api: RAPIDAPI_HOST,
        },
        safe: outcome.safe,
        blocked: outcome.blocked,
    }))
}

// ---- /ranking/rank ----

#[derive(serde::Deserialize)]
pub struct RankRequest {
    /// User's product text / description.
    pub user_text: String,
    /// Candidate phrases to reorder.
    pub phrases: Vec<String>,
}

async fn rank_phrases(
    State(state): State<AppState>,
    Json(req): Json<RankRequest>,
) -> Json<Vec<String>> {
    // Lenient empty policy: ranking an empty set is just an empty answer.
    let phrases = normalize::normalize(&req.phrases, None);
    if phrases.is_empty() {
        return Json(Vec::new());
    }
    match state
        .ranker
        .rank(&req.user_text, &phrases, RankOptions::default())
        .await
    {
        Ok(ranked) => Json(ranked),
        Err(e) => {
            warn!(error = %e, "ranking failed, returning unranked phrases");
            Json(phrases)
        }
    }
}

// ---- /tags/generate ----

#[derive(serde::Deserialize)]
pub struct TagGenerationRequest {
    /// The Nice Classification code for the product (e.g. 25 for apparel).
    pub nice_class: u16,
    /// Any text printed directly on the product.
    #[serde(default)]
    pub product_text: String,
    /// A general description of the product.
    pub product_description: String,
}

#[derive(serde::Serialize)]
pub struct TagGenerationResponse {
    pub tags: Vec<String>,
}

async fn generate_tags(
    State(state): State<AppState>,
    Json(req): Json<TagGenerationRequest>,
) -> Result<Json<TagGenerationResponse>, ApiError> {
    let tags = state
        .composer
        .generate_tags(req.nice_class, &req.product_text, &req.product_description)
        .await
        .map_err(|e| ApiError::Dependency(format!("tag generation failed: {e}")))?;
    if tags.is_empty() {
        return Err(ApiError::Dependency(
            "tag generation failed, model returned no content".into(),
        ));
    }
    Ok(Json(TagGenerationResponse { tags }))
}

// ---- /compose/all ----

#[derive(serde::Deserialize)]
pub struct ComposeRequest {
    pub title: String,
    pub nice_class: u16,
    #[serde(default)]
    pub product_text: String,
    #[serde(default)]
    pub product_description: String,
}

#[derive(serde::Serialize)]
pub struct ComposeResponse {
    pub safe_phrases: Vec<String>,
    pub all_labeled: Vec<LabeledPhrase>,
    pub tags: Vec<String>,
    pub safe_listing_description: String,
}

async fn compose_all(
    State(state): State<AppState>,
    Json(req): Json<ComposeRequest>,
) -> Result<Json<ComposeResponse>, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::InvalidInput("title is required".into()));
    }

    // Mandatory first pass: a failed generation call is terminal.
    let phrases = state
        .composer
        .generate_phrases(title)
        .await
        .map_err(|e| ApiError::Dependency(format!("phrase generation failed: {e}")))?;
    let phrases = normalize::normalize(&phrases, None);

    let (all_labeled, safe) = state.composer.label_phrases(&phrases);
    // Usefulness over strictness on this route: an all-blocked set widens
    // back to the pre-filter phrases.
    let (safe_phrases, _widened) =
        pipeline::apply_empty_safe_policy(safe, &phrases, EmptySafePolicy::WidenToPrefilter);

    // Optional enrichments degrade, never fail the request.
    let tags = if req.product_description.trim().is_empty() {
        Vec::new()
    } else {
        match state
            .composer
            .generate_tags(req.nice_class, &req.product_text, &req.product_description)
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "tag generation failed, continuing without tags");
                Vec::new()
            }
        }
    };

    let safe_listing_description = match state
        .composer
        .compose_description(title, &safe_phrases)
        .await
    {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "description composition failed, returning undecorated result");
            String::new()
        }
    };

    Ok(Json(ComposeResponse {
        safe_phrases,
        all_labeled,
        tags,
        safe_listing_description,
    }))
}
