// src/normalize.rs
//! Candidate normalization: trim, drop empties, case-insensitive dedupe
//! keeping the first-seen casing, optional cap.
//!
//! Two callers, two empty-input policies: the verify route treats an empty
//! result as a client error (`normalize_required`), the rank route just
//! returns an empty list (`normalize`).

use std::collections::HashSet;

use crate::error::ApiError;

/// Cap applied in the phrase-verification context.
pub const VERIFY_CAP: usize = 50;

/// Normalize raw candidates. `cap` of `None` means uncapped.
pub fn normalize<S: AsRef<str>>(raw: &[S], cap: Option<usize>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for s in raw {
        let trimmed = s.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.insert(key) {
            out.push(trimmed.to_string());
        }
        if let Some(cap) = cap {
            if out.len() == cap {
                break;
            }
        }
    }
    out
}

/// Strict variant: a hard request precondition. Empty output after
/// normalization is invalid client input.
pub fn normalize_required<S: AsRef<str>>(
    raw: &[S],
    cap: Option<usize>,
) -> Result<Vec<String>, ApiError> {
    let out = normalize(raw, cap);
    if out.is_empty() {
        return Err(ApiError::InvalidInput("no valid phrases provided".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_empties() {
        let out = normalize(&["  Cozy Shirt ", "", "   ", "Soft Top"], None);
        assert_eq!(out, vec!["Cozy Shirt", "Soft Top"]);
    }

    #[test]
    fn dedupes_case_insensitively_keeping_first_casing() {
        let out = normalize(&["Nike Tee", "nike tee", "NIKE TEE", "Other"], None);
        assert_eq!(out, vec!["Nike Tee", "Other"]);
    }

    #[test]
    fn cap_stops_after_n_unique_entries() {
        let raw: Vec<String> = (0..60).map(|i| format!("phrase {i}")).collect();
        let out = normalize(&raw, Some(VERIFY_CAP));
        assert_eq!(out.len(), VERIFY_CAP);
        assert_eq!(out[0], "phrase 0");
    }

    #[test]
    fn duplicates_do_not_count_toward_cap() {
        let out = normalize(&["a", "A", "b", "B", "c"], Some(3));
        assert_eq!(out, vec!["a", "b", "c"]);
    }

    #[test]
    fn required_rejects_all_whitespace_input() {
        let err = normalize_required(&["  ", "\t"], None).unwrap_err();
        assert!(err.to_string().contains("no valid phrases"));
    }

    #[test]
    fn required_passes_through_valid_input() {
        let out = normalize_required(&["one"], Some(VERIFY_CAP)).unwrap();
        assert_eq!(out, vec!["one"]);
    }
}
