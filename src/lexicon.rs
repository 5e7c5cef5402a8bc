// src/lexicon.rs
//! Pattern library: category name → ordered list of compiled patterns.
//!
//! The lexicon is data (see `lexicon.toml`). Categories are independent: each one
//! names the signal bucket it feeds, so a new category only needs a TOML table and a
//! rule entry keyed by convention.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../lexicon.toml");
    Lexicon::from_toml_str(raw).expect("valid built-in lexicon")
});

pub const DEFAULT_FUZZ_MAX_GAP: usize = 2;
pub const DEFAULT_FUZZ_MASK: &str = "*#@!$%";

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct LexiconFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub fuzz: FuzzCfg,
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FuzzCfg {
    #[serde(default = "default_max_gap")]
    pub max_gap: usize,
    #[serde(default = "default_mask")]
    pub mask: String,
}

fn default_max_gap() -> usize {
    DEFAULT_FUZZ_MAX_GAP
}
fn default_mask() -> String {
    DEFAULT_FUZZ_MASK.to_string()
}

impl Default for FuzzCfg {
    fn default() -> Self {
        Self {
            max_gap: default_max_gap(),
            mask: default_mask(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCfg {
    pub name: String,
    pub signal: SignalTarget,
    #[serde(default)]
    pub patterns: Vec<PatternCfg>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatternCfg {
    /// Literal word or short phrase, matched only at word boundaries.
    Word { text: String },
    /// Base word tolerant to interposed separators and masked letters.
    Fuzz { word: String },
    /// Raw regular expression.
    Regex { pattern: String },
}

/// Where a category's matches land in `Signals`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum SignalTarget {
    /// `explicit.<sub>` excerpt list (language, sexual, violence, occult, substances, ...).
    Explicit(String),
    Blasphemy,
    SelfHarm,
    /// `theme:<tag>` presence flag.
    Theme(String),
}

impl TryFrom<String> for SignalTarget {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let s = raw.trim();
        if let Some(sub) = s.strip_prefix("explicit.") {
            if sub.is_empty() {
                return Err(format!("empty explicit sub-category in `{s}`"));
            }
            return Ok(Self::Explicit(sub.to_string()));
        }
        if let Some(tag) = s.strip_prefix("theme:") {
            if tag.is_empty() {
                return Err(format!("empty theme tag in `{s}`"));
            }
            return Ok(Self::Theme(tag.to_string()));
        }
        match s {
            "blasphemy" => Ok(Self::Blasphemy),
            "selfharm" => Ok(Self::SelfHarm),
            other => Err(format!("unknown signal target `{other}`")),
        }
    }
}

impl fmt::Display for SignalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(sub) => write!(f, "explicit.{sub}"),
            Self::Blasphemy => f.write_str("blasphemy"),
            Self::SelfHarm => f.write_str("selfharm"),
            Self::Theme(tag) => write!(f, "theme:{tag}"),
        }
    }
}

/* ----------------------------
Compiled structures
---------------------------- */

#[derive(Debug, Clone)]
pub struct Pattern {
    /// Human-readable origin (`word:cunt`, `fuzz:fuck`, or the raw expression).
    pub source: String,
    re: Regex,
}

impl Pattern {
    pub fn word(text: &str) -> anyhow::Result<Self> {
        let expr = format!(r"(?i)\b{}\b", regex::escape(text.trim()));
        Ok(Self {
            source: format!("word:{text}"),
            re: compile(&expr)?,
        })
    }

    pub fn fuzz(word: &str, fuzz: &FuzzCfg) -> anyhow::Result<Self> {
        Ok(Self {
            source: format!("fuzz:{word}"),
            re: compile(&fuzz_expression(word, fuzz)?)?,
        })
    }

    pub fn regex(pattern: &str) -> anyhow::Result<Self> {
        Ok(Self {
            source: pattern.to_string(),
            re: compile(&format!("(?i){pattern}"))?,
        })
    }

    /// Leftmost literal match, if any.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.re.find(text).map(|m| m.as_str())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text)
    }
}

fn compile(expr: &str) -> anyhow::Result<Regex> {
    Regex::new(expr).map_err(|e| anyhow::anyhow!("pattern `{expr}` regex error: {e}"))
}

/// Build the spelling-variant expression for `word`.
///
/// Between consecutive letters up to `max_gap` non-alphanumeric characters are allowed;
/// interior letters may also be replaced by one of the `mask` characters. With the
/// defaults `fuck` matches `f.u.c.k`, `f u c k`, `f*ck` and `f**k`.
pub fn fuzz_expression(word: &str, fuzz: &FuzzCfg) -> anyhow::Result<String> {
    let letters: Vec<char> = word.trim().chars().collect();
    if letters.is_empty() {
        anyhow::bail!("fuzz pattern needs a non-empty word");
    }

    let gap = format!("[^a-z0-9]{{0,{}}}", fuzz.max_gap);
    let mask: String = fuzz
        .mask
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();

    let last = letters.len() - 1;
    let mut expr = String::from("(?i)");
    for (i, ch) in letters.iter().enumerate() {
        let lit = regex::escape(&ch.to_string());
        if i > 0 {
            expr.push_str(&gap);
        }
        if i > 0 && i < last && !mask.is_empty() {
            expr.push_str(&format!("(?:{lit}|[{mask}])"));
        } else {
            expr.push_str(&lit);
        }
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub signal: SignalTarget,
    pub patterns: Vec<Pattern>,
}

impl Category {
    /// First literal match per pattern, deduplicated, in first-seen order.
    pub fn excerpts(&self, text: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for p in &self.patterns {
            if let Some(m) = p.first_match(text) {
                if !out.iter().any(|seen| seen == m) {
                    out.push(m.to_string());
                }
            }
        }
        out
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// The engine-ready lexicon: compiled categories in file order.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub version: Option<String>,
    categories: Vec<Category>,
}

impl Lexicon {
    /// Shared built-in lexicon, compiled once per process.
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    /// Load from a TOML string
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let file: LexiconFile = toml::from_str(toml_str)?;
        Self::compile(file)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read lexicon at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
    }

    pub fn compile(file: LexiconFile) -> anyhow::Result<Self> {
        let categories = file
            .categories
            .into_iter()
            .map(|c| {
                let patterns = c
                    .patterns
                    .iter()
                    .map(|p| match p {
                        PatternCfg::Word { text } => Pattern::word(text),
                        PatternCfg::Fuzz { word } => Pattern::fuzz(word, &file.fuzz),
                        PatternCfg::Regex { pattern } => Pattern::regex(pattern),
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
                    .map_err(|e| anyhow::anyhow!("category `{}`: {}", c.name, e))?;
                Ok(Category {
                    name: c.name,
                    signal: c.signal,
                    patterns,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            version: file.version,
            categories,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}
