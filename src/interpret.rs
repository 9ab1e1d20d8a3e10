// src/interpret.rs
//! Remote availability interpreter.
//!
//! The trademark-lookup collaborator returns payloads of no reliable shape:
//! objects, arrays, bare strings, sometimes nothing. This module classifies
//! the payload into a closed set of shapes first, then maps each shape to a
//! verdict in one exhaustive match, so the fail-open default is visible in
//! a single place instead of buried in nested type checks.
//!
//! Bias: interpretation ambiguity resolves to *safe*. Over-blocking on
//! uncertain signals destroys the listing's usefulness, and the local
//! blocklist already intercepts the obvious cases. Call failures are a
//! different matter and are handled fail-closed in `safety`.

use serde_json::Value;

use crate::clients::trademark::LookupOutcome;

/// Status strings an object-shaped payload may carry to signal a conflict.
const CONFLICT_STATUSES: [&str; 3] = ["unavailable", "taken", "conflict"];

/// Markers scanned for in list- and string-shaped payloads. Broader than
/// the object set: free-text responses also say "registered".
const CONFLICT_MARKERS: [&str; 4] = ["unavailable", "taken", "conflict", "registered"];

/// Closed classification of every payload shape we have observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadShape {
    /// Object carrying an explicit boolean `available` flag.
    AvailabilityFlag(bool),
    /// Object carrying a `status` / `result` / `message` string.
    StatusText(String),
    /// Array payload, flattened to lowercased text for marker scanning.
    ListScan(String),
    /// Bare string payload, lowercased.
    TextScan(String),
    /// Anything else, including absent payloads with no other signal.
    Unknown,
}

pub fn classify_payload(payload: &Value) -> PayloadShape {
    match payload {
        Value::Object(map) => {
            if let Some(Value::Bool(b)) = map.get("available") {
                return PayloadShape::AvailabilityFlag(*b);
            }
            for key in ["status", "result", "message"] {
                if let Some(Value::String(s)) = map.get(key) {
                    let s = s.trim();
                    // empty strings fall through to the next field
                    if !s.is_empty() {
                        return PayloadShape::StatusText(s.to_lowercase());
                    }
                }
            }
            PayloadShape::Unknown
        }
        Value::Array(items) => {
            // First few elements are enough to spot a conflict marker.
            let text = items
                .iter()
                .take(5)
                .map(value_to_scan_text)
                .collect::<Vec<_>>()
                .join(" ");
            PayloadShape::ListScan(text)
        }
        Value::String(s) => PayloadShape::TextScan(s.to_lowercase()),
        _ => PayloadShape::Unknown,
    }
}

fn value_to_scan_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

/// Interpret one lookup outcome. `None` means the phrase looks safe; a
/// reason string means blocked. Never fails: every unrecognized input
/// resolves to safe.
pub fn interpret(outcome: &LookupOutcome) -> Option<String> {
    // Transport-level error surfaced as data by the wrapper.
    if let Some(err) = &outcome.error {
        return Some(err.clone());
    }

    // The HTTP layer itself said something clearly bad.
    if let Some(code) = outcome.status_code {
        if code >= 400 {
            return Some(format!("lookup error {code}"));
        }
    }

    let Some(payload) = &outcome.payload else {
        return Some("empty response".to_string());
    };

    match classify_payload(payload) {
        PayloadShape::AvailabilityFlag(true) => None,
        PayloadShape::AvailabilityFlag(false) => Some("mark unavailable".to_string()),
        PayloadShape::StatusText(status) => {
            if CONFLICT_STATUSES.contains(&status.as_str()) {
                Some("mark unavailable".to_string())
            } else {
                // structured but inconclusive: safe
                None
            }
        }
        PayloadShape::ListScan(text) | PayloadShape::TextScan(text) => {
            if CONFLICT_MARKERS.iter().any(|m| text.contains(m)) {
                Some("mark unavailable".to_string())
            } else {
                None
            }
        }
        PayloadShape::Unknown => None,
    }
}
