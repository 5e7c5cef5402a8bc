// src/api.rs
//! HTTP surface. Thin: every handler delegates to `analyze` or `media_ai`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analyze::{
    self, analyze_lyrics, Band, HotReloadRules, LyricsAnalysis, LyricsContext, Params,
    ScoreResult, SongMeta, VerseBook,
};
use crate::config::{AiConfig, EngineConfig};
use crate::lexicon::Lexicon;
use crate::media_ai::{build_analyzer, DiscernmentAnalysis, DynMediaAnalyzer, MediaRequest};
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<HotReloadRules>,
    pub lexicon: Arc<Lexicon>,
    pub verses: Arc<VerseBook>,
    pub params: Params,
    pub ai: DynMediaAnalyzer,
}

impl AppState {
    pub fn new(
        engine: &EngineConfig,
        lexicon: Lexicon,
        rules: HotReloadRules,
        verses: VerseBook,
        ai: DynMediaAnalyzer,
    ) -> Self {
        Self {
            rules: Arc::new(rules),
            lexicon: Arc::new(lexicon),
            verses: Arc::new(verses),
            params: Params::from(engine),
            ai,
        }
    }

    /// Build from `config/` + env. Falls back to built-in data when a file is missing;
    /// an invalid engine config or custom lexicon is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let engine = EngineConfig::from_env()?;
        let lexicon = engine.load_lexicon()?;
        let ai = build_analyzer(&AiConfig::load_or_default());
        Ok(Self::new(
            &engine,
            lexicon,
            HotReloadRules::new(None),
            VerseBook::from_env(),
            ai,
        ))
    }
}

/// Debug/metrics routes are mounted only with `DEBUG_ROUTES=1`.
fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES").ok().as_deref() == Some("1")
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze/text", post(analyze_text))
        .route("/analyze/lyrics", post(analyze_lyrics_handler))
        .route("/analyze/media", post(analyze_media));

    if debug_routes_enabled() {
        app = app.merge(analyze::debug::router());
        match Metrics::init() {
            Some(m) => app = app.merge(m.router()),
            None => warn!("metrics route not mounted"),
        }
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Deserialize)]
struct AnalyzeTextReq {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeTextResp {
    #[serde(flatten)]
    score: ScoreResult,
    band: Band,
}

async fn analyze_text(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeTextReq>,
) -> Json<AnalyzeTextResp> {
    let rules = state.rules.current();
    let score = analyze::analyze_text_with(&body.text, &rules.rules, &state.lexicon, state.params);
    Json(AnalyzeTextResp {
        band: Band::from_total(score.total),
        score,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeLyricsReq {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    raw_lyrics: Option<String>,
}

async fn analyze_lyrics_handler(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeLyricsReq>,
) -> Json<LyricsAnalysis> {
    let rules = state.rules.current();
    let ctx = LyricsContext {
        rules: &rules.rules,
        lexicon: &state.lexicon,
        verses: &state.verses,
        params: state.params,
    };
    let meta = SongMeta {
        title: body.title,
        artist: body.artist,
    };
    let lyrics = body.raw_lyrics.unwrap_or_default();
    Json(analyze_lyrics(meta, &lyrics, ctx))
}

async fn analyze_media(
    State(state): State<AppState>,
    Json(req): Json<MediaRequest>,
) -> (HeaderMap, Json<DiscernmentAnalysis>) {
    let analysis = state.ai.analyze(&req).await;
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-ai-provider",
        HeaderValue::from_static(state.ai.provider_name()),
    );
    (headers, Json(analysis))
}
