// src/blocklist.rs
//! Local famous-marks blocklist: the cheap, zero-network first pass of the
//! safety check. A hit here short-circuits the remote lookup entirely.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_BLOCKLIST_CONFIG_PATH: &str = "config/blocklist.toml";
pub const ENV_BLOCKLIST_CONFIG_PATH: &str = "BLOCKLIST_CONFIG_PATH";

/// Compiled-in marks: well-known brands, franchises, and platforms that a
/// marketplace listing must never lean on. Matching is substring-based, so
/// short entries are deliberate ("coke" also catches "coke-themed").
static FAMOUS_MARKS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "disney", "pixar", "marvel", "harry potter", "hogwarts",
        "nike", "adidas", "yeezy", "puma",
        "apple", "iphone", "ipad", "macbook",
        "coca-cola", "coke", "pepsi", "sprite",
        "minecraft", "fortnite", "roblox", "pokemon", "nintendo",
        "barbie", "lego", "hello kitty", "sanrio",
        "taylor swift", "swiftie", "swifties",
        "starbucks", "mcdonalds", "mcdonald's",
        "nba", "nfl", "mlb", "nhl", "fifa", "olympics",
        "tesla", "google", "instagram", "tiktok", "youtube",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Default, Deserialize)]
struct BlocklistFile {
    #[serde(default)]
    marks: Vec<String>,
    #[serde(default)]
    fallback_defaults: Vec<String>,
}

/// The matcher owns the compiled-in set plus any operator-supplied
/// extensions. Extensions add to the built-ins, never replace them.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    extra_marks: Vec<String>,
    fallback_defaults: Vec<String>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load optional extensions from TOML. Uses `BLOCKLIST_CONFIG_PATH` or
    /// defaults to `config/blocklist.toml`. A missing file is not an error;
    /// a malformed file is logged and ignored.
    pub fn from_config() -> Self {
        let path = std::env::var(ENV_BLOCKLIST_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BLOCKLIST_CONFIG_PATH));

        let content = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match Self::from_toml_str(&content) {
            Ok(bl) => {
                info!(
                    path = %path.display(),
                    extra = bl.extra_marks.len(),
                    fallbacks = bl.fallback_defaults.len(),
                    "loaded blocklist extensions"
                );
                bl
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed blocklist config");
                Self::default()
            }
        }
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let file: BlocklistFile = toml::from_str(toml_str)?;
        Ok(Self {
            extra_marks: file
                .marks
                .into_iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            fallback_defaults: file
                .fallback_defaults
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// Operator-supplied generic fallbacks, usable as a server-side default
    /// for the minimum-safe top-up when the caller supplies none.
    pub fn fallback_defaults(&self) -> &[String] {
        &self.fallback_defaults
    }

    /// Case-insensitive substring match against the famous-marks set.
    /// Returns the block reason on a hit, `None` otherwise. Any match wins;
    /// iteration order does not matter because the outcome is the same.
    pub fn hit(&self, phrase: &str) -> Option<String> {
        let s = phrase.to_lowercase();
        for mark in FAMOUS_MARKS.iter() {
            if s.contains(mark) {
                return Some(format!("famous mark detected: {mark}"));
            }
        }
        for mark in &self.extra_marks {
            if s.contains(mark.as_str()) {
                return Some(format!("famous mark detected: {mark}"));
            }
        }
        None
    }
}
