// tests/safety_check.rs
//
// Safety-checker semantics against a scripted trademark-lookup mock:
// - local blocklist hits never reach the remote collaborator
// - explicit availability flags decide safe/blocked
// - unrecognized payload shapes resolve safe (fail-open on ambiguity)
// - call failures resolve blocked (fail-closed on failure)

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use listing_guard::blocklist::Blocklist;
use listing_guard::clients::trademark::{LookupOutcome, TrademarkLookup};
use listing_guard::safety::SafetyChecker;

/// Lookup mock that replays one scripted payload and counts calls.
struct ScriptedLookup {
    calls: AtomicUsize,
    script: Script,
}

enum Script {
    Payload(Value),
    TransportError(String),
    CallFailure,
}

impl ScriptedLookup {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TrademarkLookup for ScriptedLookup {
    async fn check_available(&self, _term: &str) -> Result<LookupOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Payload(v) => Ok(LookupOutcome {
                status_code: Some(200),
                payload: Some(v.clone()),
                error: None,
            }),
            Script::TransportError(msg) => Ok(LookupOutcome {
                status_code: None,
                payload: None,
                error: Some(msg.clone()),
            }),
            Script::CallFailure => Err(anyhow::anyhow!("simulated lookup timeout")),
        }
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn checker_with(lookup: Arc<ScriptedLookup>) -> SafetyChecker {
    SafetyChecker::new(Arc::new(Blocklist::new()), lookup, 4)
}

#[tokio::test]
async fn famous_mark_blocks_locally_without_remote_call() {
    let lookup = ScriptedLookup::new(Script::Payload(json!({"available": true})));
    let checker = checker_with(Arc::clone(&lookup));

    let decision = checker
        .check_one("Nike Swoosh Tee", Some(25))
        .await
        .expect("should be blocked");
    assert_eq!(decision.reasons.len(), 1);
    assert!(decision.reasons[0].contains("famous mark detected"));
    assert_eq!(lookup.calls(), 0, "remote collaborator must not be called");
}

#[tokio::test]
async fn available_false_blocks_with_unavailability_reason() {
    let lookup = ScriptedLookup::new(Script::Payload(json!({"payload_shape": "ignored", "available": false})));
    let checker = checker_with(Arc::clone(&lookup));

    let decision = checker
        .check_one("Cozy Cotton Shirt", None)
        .await
        .expect("should be blocked");
    assert!(decision.reasons[0].contains("unavailable"));
    assert_eq!(lookup.calls(), 1);
}

#[tokio::test]
async fn available_true_is_safe() {
    let lookup = ScriptedLookup::new(Script::Payload(json!({"available": true})));
    let checker = checker_with(lookup);

    assert!(checker.check_one("Cozy Cotton Shirt", None).await.is_none());
}

#[tokio::test]
async fn unrecognized_payload_shape_is_safe() {
    let lookup = ScriptedLookup::new(Script::Payload(json!(42)));
    let checker = checker_with(lookup);

    assert!(
        checker.check_one("Cozy Cotton Shirt", None).await.is_none(),
        "unknown shape must fail open"
    );
}

#[tokio::test]
async fn transport_error_blocks_with_error_text() {
    let lookup = ScriptedLookup::new(Script::TransportError("http error: timed out".into()));
    let checker = checker_with(lookup);

    let decision = checker
        .check_one("Cozy Cotton Shirt", None)
        .await
        .expect("should be blocked");
    assert_eq!(decision.reasons, vec!["http error: timed out"]);
}

#[tokio::test]
async fn call_failure_blocks_fail_closed() {
    let lookup = ScriptedLookup::new(Script::CallFailure);
    let checker = checker_with(lookup);

    let decision = checker
        .check_one("Cozy Cotton Shirt", None)
        .await
        .expect("should be blocked");
    assert!(decision.reasons[0].contains("lookup call failed"));
}

#[tokio::test]
async fn batch_failure_isolation_blocks_only_its_own_phrase() {
    // a failing lookup blocks every non-blocklisted phrase independently,
    // but the blocklisted one still carries its local reason
    let lookup = ScriptedLookup::new(Script::CallFailure);
    let checker = checker_with(Arc::clone(&lookup));

    let phrases: Vec<String> = vec!["Lego Stand".into(), "Cozy Cotton Shirt".into()];
    let results = checker.check_batch(&phrases, None).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].as_ref().unwrap().reasons[0].contains("famous mark"));
    assert!(results[1].as_ref().unwrap().reasons[0].contains("lookup call failed"));
    assert_eq!(lookup.calls(), 1, "only the clean phrase reaches the lookup");
}
