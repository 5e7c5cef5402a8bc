//! Rule set (hot-reloaded from `config/rules.json`).
//!
//! JSON shape (a bare array of rules is accepted too):
//! {
//!   "rules": [
//!     { "id": "worship", "title": "...", "description": "...",
//!       "category": "lyrics", "weight": 30, "anchors": ["Psalms 95:6"] }
//!   ]
//! }
//!
//! Rules are data: the id selects the evaluator (see `scoring`), the weight gives the
//! magnitude, anchors are scripture keys surfaced on hits. Unknown ids load fine and
//! simply never fire.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::SystemTime,
};
use tracing::{debug, warn};

pub const DEFAULT_RULES_PATH: &str = "config/rules.json";
pub const ENV_RULES_PATH: &str = "DISCERN_RULES_PATH";

const BUILTIN_RULES_JSON: &str = include_str!("../../config/rules.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub anchors: Vec<String>,
}

impl Rule {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            weight,
            anchors: Vec::new(),
        }
    }

    pub fn with_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchors = anchors.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Wrapped(RuleSet),
    Bare(Vec<Rule>),
}

impl RuleSet {
    /// Rules shipped with the crate (`config/rules.json` at build time).
    pub fn builtin() -> Self {
        // The embedded file is validated by the `builtin_rules_parse` test.
        parse_rules(BUILTIN_RULES_JSON.as_bytes()).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.id.clone()).collect()
    }
}

/// Resolve the rule file path: `DISCERN_RULES_PATH` or `config/rules.json`.
pub fn rules_path_from_env() -> PathBuf {
    std::env::var(ENV_RULES_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULES_PATH))
}

/// Hot-reload wrapper: reloads when the rule file mtime changes.
/// A missing or malformed file keeps the last good rule set.
#[derive(Debug)]
pub struct HotReloadRules {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    rules: RuleSet,
    last_modified: Option<SystemTime>,
}

impl HotReloadRules {
    /// Create with a path (defaults to `rules_path_from_env()` if `None`),
    /// seeded with the built-in rules.
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(rules_path_from_env);
        Self {
            path,
            inner: RwLock::new(State {
                rules: RuleSet::builtin(),
                last_modified: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the latest rules, reloading if the file changed.
    pub fn current(&self) -> RuleSet {
        let needs_reload = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => {
                let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
                guard.last_modified != Some(mtime)
            }
            Err(_) => false,
        };

        if !needs_reload {
            return self
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .rules
                .clone();
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Double-check in case of races.
        if let Ok(mtime) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            if guard.last_modified != Some(mtime) {
                match load_rules_file(&self.path) {
                    Ok(rules) => {
                        debug!(path = %self.path.display(), count = rules.rules.len(), "rules reloaded");
                        guard.rules = rules;
                    }
                    Err(e) => {
                        warn!(path = %self.path.display(), error = %e, "rules reload failed; keeping previous set");
                    }
                }
                guard.last_modified = Some(mtime);
            }
        }
        guard.rules.clone()
    }
}

pub fn load_rules_file(path: &Path) -> io::Result<RuleSet> {
    let bytes = fs::read(path)?;
    parse_rules(&bytes)
}

fn parse_rules(bytes: &[u8]) -> io::Result<RuleSet> {
    let file: RuleFile = serde_json::from_slice(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(match file {
        RuleFile::Wrapped(set) => set,
        RuleFile::Bare(rules) => RuleSet { rules },
    })
}
