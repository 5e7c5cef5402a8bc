// src/analyze/mod.rs
//! Analysis pipeline entry: raw text → normalize → extract → score → calibrate.
//!
//! Every stage is a pure function of its inputs; the only process-wide state is
//! the compiled built-in lexicon (read-only).

pub mod calibrate;
pub mod debug;
pub mod rules;
pub mod scoring;
pub mod verses;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::EngineConfig;
use crate::lexicon::Lexicon;
use crate::normalize::normalize;
use crate::signals::{extract, Signals};

// Re-export convenient types.
pub use crate::analyze::calibrate::{calibrate, calibrate_with, Band, CalibrationBands};
pub use crate::analyze::rules::{HotReloadRules, Rule, RuleSet};
pub use crate::analyze::scoring::{score, Hit, ScoreResult};
pub use crate::analyze::verses::{Verse, VerseBook};

/// Scoring knobs shared by every call in a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub baseline: i32,
    pub bands: CalibrationBands,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            baseline: scoring::NEUTRAL_BASELINE,
            bands: CalibrationBands::default(),
        }
    }
}

impl From<&EngineConfig> for Params {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            baseline: cfg.baseline(),
            bands: cfg.bands(),
        }
    }
}

/// `analyzeText`: built-in lexicon, default baseline and bands.
pub fn analyze_text(raw: &str, rules: &[Rule]) -> ScoreResult {
    analyze_text_with(raw, rules, Lexicon::builtin(), Params::default())
}

pub fn analyze_text_with(raw: &str, rules: &[Rule], lexicon: &Lexicon, params: Params) -> ScoreResult {
    let normalized = normalize(raw);
    let signals = extract(&normalized, lexicon);
    let result = score_signals(&signals, rules, params);
    log_analysis(raw, &result);
    result
}

/// Score pre-built signals and calibrate the total.
/// `subscores`/`hits` are the raw scorer output; only `total` is calibrated.
pub fn score_signals(signals: &Signals, rules: &[Rule], params: Params) -> ScoreResult {
    let raw = scoring::score_from_baseline(signals, rules, params.baseline);
    let total = calibrate_with(i32::from(raw.total), &raw.hits, params.bands);
    crate::metrics::record_analysis(total, &raw.hits);
    ScoreResult { total, ..raw }
}

/// Song identity echoed back with a lyrics analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LyricsReport {
    pub signals: Signals,
    pub score: ScoreResult,
    pub band: Band,
    pub verses: BTreeMap<String, Verse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsAnalysis {
    pub meta: SongMeta,
    pub lyrics_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<LyricsReport>,
}

/// Everything a lyrics analysis needs besides the text itself.
#[derive(Debug, Clone, Copy)]
pub struct LyricsContext<'a> {
    pub rules: &'a [Rule],
    pub lexicon: &'a Lexicon,
    pub verses: &'a VerseBook,
    pub params: Params,
}

/// Full lyrics report: signals, calibrated score, band, and verse text for each anchor.
/// Blank lyrics are reported as unavailable rather than scored.
pub fn analyze_lyrics(meta: SongMeta, raw_lyrics: &str, ctx: LyricsContext<'_>) -> LyricsAnalysis {
    let normalized = normalize(raw_lyrics);
    if normalized.is_empty() {
        return LyricsAnalysis {
            meta,
            lyrics_available: false,
            message: Some("No lyrics provided. Paste the lyrics to analyze.".to_string()),
            analysis: None,
        };
    }

    let signals = extract(&normalized, ctx.lexicon);
    let score = score_signals(&signals, ctx.rules, ctx.params);
    log_analysis(raw_lyrics, &score);

    let verses = ctx.verses.for_hits(&score.hits);
    LyricsAnalysis {
        meta,
        lyrics_available: true,
        message: None,
        analysis: Some(LyricsReport {
            band: Band::from_total(score.total),
            signals,
            score,
            verses,
        }),
    }
}

/// Dev-only diagnostics: never logs raw text, only a hashed id + rule ids.
fn log_analysis(raw: &str, result: &ScoreResult) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(raw);
    let rules: Vec<&str> = result.hits.iter().map(|h| h.rule_id.as_str()).collect();
    info!(
        target: "discernment",
        %id,
        total = result.total,
        band = Band::from_total(result.total).label(),
        rules = ?rules,
        "analysis"
    );
}

// Dev logging gate: DISCERN_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("DISCERN_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

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
