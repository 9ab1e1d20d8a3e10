// src/safety.rs
//! Phrase safety checker: local blocklist short-circuit, then remote
//! availability lookup, then interpretation.
//!
//! Policy, applied uniformly at every layer: a failed lookup *call*
//! (transport, timeout, task failure) blocks the phrase; an ambiguous
//! *response* lets it through. The interpreter handles the second half,
//! this module enforces the first.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::blocklist::Blocklist;
use crate::clients::trademark::TrademarkLookup;
use crate::interpret;

/// Outcome of a safety check on one blocked phrase. A safe phrase produces
/// no decision record at all, so `reasons` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseDecision {
    pub phrase: String,
    pub reasons: Vec<String>,
}

/// Short anonymized id for log lines; raw phrases are never logged above
/// debug level.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Clone)]
pub struct SafetyChecker {
    blocklist: Arc<Blocklist>,
    lookup: Arc<dyn TrademarkLookup>,
    concurrency: usize,
}

impl SafetyChecker {
    pub fn new(
        blocklist: Arc<Blocklist>,
        lookup: Arc<dyn TrademarkLookup>,
        concurrency: usize,
    ) -> Self {
        Self {
            blocklist,
            lookup,
            concurrency: concurrency.max(1),
        }
    }

    /// Check one phrase. Returns `Some(decision)` when blocked, `None` when
    /// safe. Infallible: every failure mode maps to a blocked decision.
    ///
    /// `nice_class` is carried for future class-aware logic; no blocking
    /// rule consults it today.
    pub async fn check_one(&self, phrase: &str, nice_class: Option<u16>) -> Option<PhraseDecision> {
        counter!("phrase_checks_total").increment(1);

        // 1) quick local blocklist; a hit skips the remote call entirely
        if let Some(reason) = self.blocklist.hit(phrase) {
            counter!("blocklist_hits_total").increment(1);
            debug!(id = %anon_hash(phrase), ?nice_class, %reason, "blocked locally");
            return Some(PhraseDecision {
                phrase: phrase.to_string(),
                reasons: vec![reason],
            });
        }

        // 2) remote availability; a failed call blocks (fail-closed)
        let outcome = match self.lookup.check_available(phrase).await {
            Ok(o) => o,
            Err(e) => {
                counter!("lookup_call_failures_total").increment(1);
                warn!(id = %anon_hash(phrase), error = %e, "lookup call failed");
                return Some(PhraseDecision {
                    phrase: phrase.to_string(),
                    reasons: vec![format!("lookup call failed: {e}")],
                });
            }
        };

        // 3) interpretation; ambiguity resolves to safe inside `interpret`
        match interpret::interpret(&outcome) {
            Some(reason) => {
                counter!("lookup_blocks_total").increment(1);
                debug!(id = %anon_hash(phrase), %reason, "blocked by lookup");
                Some(PhraseDecision {
                    phrase: phrase.to_string(),
                    reasons: vec![reason],
                })
            }
            None => None,
        }
    }

    /// Check N phrases concurrently under the configured bound. Output
    /// order equals input order; individual checks are independent and a
    /// failed task never aborts the rest (it blocks its own phrase only).
    pub async fn check_batch(
        &self,
        phrases: &[String],
        nice_class: Option<u16>,
    ) -> Vec<Option<PhraseDecision>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set: JoinSet<(usize, Option<PhraseDecision>)> = JoinSet::new();

        for (idx, phrase) in phrases.iter().enumerate() {
            let checker = self.clone();
            let phrase = phrase.clone();
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                // closed semaphore cannot happen; holder lives as long as the set
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let decision = checker.check_one(&phrase, nice_class).await;
                (idx, decision)
            });
        }

        let mut out: Vec<Option<PhraseDecision>> = vec![None; phrases.len()];
        let mut failed: Vec<usize> = (0..phrases.len()).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, decision)) => {
                    failed.retain(|&i| i != idx);
                    out[idx] = decision;
                }
                Err(e) => {
                    warn!(error = %e, "safety check task failed");
                }
            }
        }
        // A task that never reported (cancelled/panicked) blocks its phrase,
        // same fail-closed rule as a failed call.
        for idx in failed {
            counter!("lookup_call_failures_total").increment(1);
            out[idx] = Some(PhraseDecision {
                phrase: phrases[idx].clone(),
                reasons: vec!["safety check task failed".to_string()],
            });
        }
        out
    }
}
