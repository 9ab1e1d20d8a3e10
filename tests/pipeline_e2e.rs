// tests/pipeline_e2e.rs
//
// End-to-end pipeline scenarios: normalize → safety fan-out → partition →
// fallback top-up → relevance ranking, with mocked collaborators.

use anyhow::Result;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use listing_guard::blocklist::Blocklist;
use listing_guard::clients::embedding::Embedder;
use listing_guard::clients::trademark::{LookupOutcome, TrademarkLookup};
use listing_guard::normalize;
use listing_guard::pipeline::{self, EmptySafePolicy};
use listing_guard::ranking::{RankOptions, RelevanceRanker};
use listing_guard::safety::SafetyChecker;

struct FixedLookup {
    available: bool,
}

#[async_trait::async_trait]
impl TrademarkLookup for FixedLookup {
    async fn check_available(&self, _term: &str) -> Result<LookupOutcome> {
        Ok(LookupOutcome {
            status_code: Some(200),
            payload: Some(json!({ "available": self.available })),
            error: None,
        })
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Embedder with a canned vector per known text.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(pairs: &[(&str, &[f32])]) -> Arc<Self> {
        Arc::new(Self {
            table: pairs
                .iter()
                .map(|(t, v)| (t.to_string(), v.to_vec()))
                .collect(),
        })
    }
}

#[async_trait::async_trait]
impl Embedder for TableEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| {
                self.table
                    .get(t)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("no vector for {t:?}"))
            })
            .collect()
    }
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await
            .map(|mut v| v.remove(0))
    }
    fn name(&self) -> &'static str {
        "table"
    }
}

fn checker(available: bool) -> SafetyChecker {
    SafetyChecker::new(
        Arc::new(Blocklist::new()),
        Arc::new(FixedLookup { available }),
        4,
    )
}

fn phrases(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn nike_scenario_filters_dedupes_and_ranks() {
    // candidates: ["Nike Tee", "Cozy Cotton Shirt", "nike tee", "Soft Cotton Top"]
    // reference "soft cotton shirt", min_safe 2, no fallback
    let raw = phrases(&["Nike Tee", "Cozy Cotton Shirt", "nike tee", "Soft Cotton Top"]);
    let normalized = normalize::normalize(&raw, Some(normalize::VERIFY_CAP));
    assert_eq!(
        normalized,
        phrases(&["Nike Tee", "Cozy Cotton Shirt", "Soft Cotton Top"]),
        "duplicate dropped, first casing kept"
    );

    let embedder = TableEmbedder::new(&[
        ("soft cotton shirt", &[1.0, 0.0, 0.0]),
        ("Soft Cotton Top", &[0.95, 0.05, 0.0]),
        ("Cozy Cotton Shirt", &[0.80, 0.20, 0.0]),
    ]);
    let ranker = RelevanceRanker::new(embedder);

    let outcome = pipeline::filter_and_rank(
        &checker(true),
        &ranker,
        &normalized,
        "soft cotton shirt",
        Some(25),
        2,
        &[],
        EmptySafePolicy::ReturnEmpty,
        RankOptions::default(),
    )
    .await;

    assert_eq!(outcome.blocked.len(), 1);
    assert_eq!(outcome.blocked[0].phrase, "Nike Tee");
    assert!(!outcome.safe.iter().any(|p| p.to_lowercase().contains("nike")));
    assert_eq!(
        outcome.safe,
        phrases(&["Soft Cotton Top", "Cozy Cotton Shirt"]),
        "ranked by similarity to the reference"
    );
}

#[tokio::test]
async fn all_blocked_tops_up_from_fallback_list() {
    // every candidate is taken remotely; fallback closes the quota
    let input = phrases(&["Branded Mug", "Taken Name"]);
    let fallbacks = phrases(&["Handmade Gift", "Custom Design"]);

    let outcome = pipeline::filter_candidates(
        &checker(false),
        &input,
        None,
        2,
        &fallbacks,
        EmptySafePolicy::ReturnEmpty,
    )
    .await;

    assert_eq!(outcome.safe, fallbacks);
    assert_eq!(outcome.topped_up, 2);
    assert_eq!(outcome.blocked.len(), 2);
}

#[tokio::test]
async fn phrase_never_appears_in_both_partitions() {
    let input = phrases(&["Nike Tee", "Plain Mug", "Lego Bricks", "Soft Top"]);
    let outcome = pipeline::filter_candidates(
        &checker(true),
        &input,
        None,
        1,
        &[],
        EmptySafePolicy::ReturnEmpty,
    )
    .await;

    for d in &outcome.blocked {
        assert!(
            !outcome.safe.contains(&d.phrase),
            "{} is in both partitions",
            d.phrase
        );
    }
    assert_eq!(outcome.safe.len() + outcome.blocked.len(), input.len());
}

#[tokio::test]
async fn ranking_failure_degrades_to_unranked_safe_set() {
    // embedder knows none of the texts, so both batch and per-text fail
    let embedder = TableEmbedder::new(&[]);
    let ranker = RelevanceRanker::new(embedder);
    let input = phrases(&["Plain Mug", "Soft Top"]);

    let outcome = pipeline::filter_and_rank(
        &checker(true),
        &ranker,
        &input,
        "anything",
        None,
        1,
        &[],
        EmptySafePolicy::ReturnEmpty,
        RankOptions::default(),
    )
    .await;

    assert_eq!(outcome.safe, input, "safe set survives a ranking failure");
}
