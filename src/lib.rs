// src/lib.rs
//! Discernment scoring for media text.
//!
//! Pipeline (all pure, safe to call concurrently):
//! `normalize` → `signals::extract` (with a `Lexicon`) → `analyze::score` (with rules)
//! → `analyze::calibrate`. `analyze::analyze_text` runs the whole chain.

pub mod analyze;
pub mod api;
pub mod config;
pub mod lexicon;
pub mod media_ai;
pub mod metrics;
pub mod normalize;
pub mod signals;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    analyze_text, calibrate, score, Band, Hit, Rule, RuleSet, ScoreResult,
};
pub use crate::api::router;
pub use crate::lexicon::Lexicon;
pub use crate::normalize::normalize;
pub use crate::signals::{extract, Signals};

use tracing::info;

/// Call this from the Shuttle entrypoint (after tracing init) to perform a one-off
/// smoke test of the media AI client. It won't panic on failure; it just logs the result.
pub async fn run_ai_quick_probe() -> anyhow::Result<()> {
    // Path is relative to the runtime working dir (repo root in `cargo shuttle run`)
    let ai = ai_bootstrap::AiRuntime::from_path(config::ai::DEFAULT_AI_CONFIG_PATH)?;
    ai.quick_probe().await;
    info!("AI quick probe finished");
    Ok(())
}
