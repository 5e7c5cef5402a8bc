//! Anchor key → verse text lookup, used when presenting hits.
//!
//! Loaded from `config/verses.json` (override with `DISCERN_VERSES_PATH`):
//! `{ "Psalms 95:6": { "text": "...", "translation": "WEB" }, ... }`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use super::scoring::Hit;

pub const DEFAULT_VERSES_PATH: &str = "config/verses.json";
pub const ENV_VERSES_PATH: &str = "DISCERN_VERSES_PATH";

const BUILTIN_VERSES_JSON: &str = include_str!("../../config/verses.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub text: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Debug, Clone, Default)]
pub struct VerseBook {
    verses: HashMap<String, Verse>,
}

impl VerseBook {
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_VERSES_JSON).unwrap_or_default()
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let verses: HashMap<String, Verse> = serde_json::from_str(s)?;
        Ok(Self { verses })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read verses at {}: {}", path.display(), e))?;
        Self::from_json_str(&content)
    }

    /// `DISCERN_VERSES_PATH`, then `config/verses.json`, then the embedded copy.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_VERSES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_VERSES_PATH));
        match Self::from_path(&path) {
            Ok(book) => book,
            Err(e) => {
                tracing::debug!(error = %e, "using built-in verses");
                Self::builtin()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Verse> {
        self.verses.get(key)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Verses referenced by `hits`; anchors without text are skipped.
    pub fn for_hits(&self, hits: &[Hit]) -> BTreeMap<String, Verse> {
        hits.iter()
            .flat_map(|h| h.refs.iter())
            .filter_map(|r| self.get(r).map(|v| (r.clone(), v.clone())))
            .collect()
    }
}
