// src/pipeline.rs
//! Safety-then-relevance pipeline: normalize → concurrent safety fan-out →
//! partition → fallback top-up → optional relevance ranking.
//!
//! Pure orchestration over the checker and ranker; no I/O of its own.

use metrics::counter;
use std::collections::HashSet;
use tracing::warn;

use crate::ranking::{RankOptions, RelevanceRanker};
use crate::safety::{PhraseDecision, SafetyChecker};

/// What to do when safety filtering removes every candidate and the
/// fallback list cannot close the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySafePolicy {
    /// Return the honest empty set (verification route).
    ReturnEmpty,
    /// Fall back to the pre-filter candidate set: usefulness over strict
    /// trademark safety (compose route).
    WidenToPrefilter,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Safe phrases, in normalized-candidate order (plus top-ups at the
    /// end). Not relevance-ranked at this stage.
    pub safe: Vec<String>,
    pub blocked: Vec<PhraseDecision>,
    /// Fallback entries appended to meet the minimum-safe quota.
    pub topped_up: usize,
    /// True when the widen escape hatch replaced an empty safe set.
    pub widened: bool,
}

/// Apply the empty-safe policy to a finished partition. Returns the
/// (possibly widened) safe set and whether widening happened.
pub fn apply_empty_safe_policy(
    safe: Vec<String>,
    prefilter: &[String],
    policy: EmptySafePolicy,
) -> (Vec<String>, bool) {
    if safe.is_empty() && policy == EmptySafePolicy::WidenToPrefilter && !prefilter.is_empty() {
        counter!("widen_events_total").increment(1);
        warn!(
            candidates = prefilter.len(),
            "all candidates blocked and no fallback available, widening to pre-filter set"
        );
        return (prefilter.to_vec(), true);
    }
    (safe, false)
}

/// Run the safety stage over already-normalized candidates.
pub async fn filter_candidates(
    checker: &SafetyChecker,
    phrases: &[String],
    nice_class: Option<u16>,
    min_safe: usize,
    fallback_defaults: &[String],
    policy: EmptySafePolicy,
) -> FilterOutcome {
    let results = checker.check_batch(phrases, nice_class).await;

    let mut safe: Vec<String> = Vec::new();
    let mut blocked: Vec<PhraseDecision> = Vec::new();
    for (phrase, decision) in phrases.iter().zip(results) {
        match decision {
            Some(d) => blocked.push(d),
            None => safe.push(phrase.clone()),
        }
    }

    // Top up from fallbacks until the quota is met. Dedupe against the
    // original candidates, the blocked set, and what is already safe.
    let mut topped_up = 0usize;
    if safe.len() < min_safe && !fallback_defaults.is_empty() {
        let mut existing: HashSet<String> =
            phrases.iter().map(|p| p.to_lowercase()).collect();
        existing.extend(blocked.iter().map(|d| d.phrase.to_lowercase()));
        existing.extend(safe.iter().map(|p| p.to_lowercase()));

        for fb in fallback_defaults {
            let s = fb.trim();
            if s.is_empty() {
                continue;
            }
            let key = s.to_lowercase();
            if existing.contains(&key) {
                continue;
            }
            existing.insert(key);
            safe.push(s.to_string());
            topped_up += 1;
            if safe.len() >= min_safe {
                break;
            }
        }
        if topped_up > 0 {
            counter!("fallback_topups_total").increment(topped_up as u64);
        }
    }

    let (safe, widened) = apply_empty_safe_policy(safe, phrases, policy);

    FilterOutcome {
        safe,
        blocked,
        topped_up,
        widened,
    }
}

/// Full pipeline: safety stage, then relevance ranking of the safe set
/// against `reference`. Ranking failure never aborts the pipeline; the
/// unranked safe set is returned instead.
#[allow(clippy::too_many_arguments)]
pub async fn filter_and_rank(
    checker: &SafetyChecker,
    ranker: &RelevanceRanker,
    phrases: &[String],
    reference: &str,
    nice_class: Option<u16>,
    min_safe: usize,
    fallback_defaults: &[String],
    policy: EmptySafePolicy,
    opts: RankOptions,
) -> FilterOutcome {
    let mut outcome = filter_candidates(
        checker,
        phrases,
        nice_class,
        min_safe,
        fallback_defaults,
        policy,
    )
    .await;

    match ranker.rank(reference, &outcome.safe, opts).await {
        Ok(ranked) => outcome.safe = ranked,
        Err(e) => {
            counter!("ranking_failures_total").increment(1);
            warn!(error = %e, "relevance ranking failed, returning unranked safe set");
        }
    }
    outcome
}
