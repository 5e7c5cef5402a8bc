//! Long-form media analysis through an AI provider.
//!
//! Movies, shows and books have no lyrics to scan, so the app asks a model for a
//! fixed-shape JSON verdict (`DiscernmentAnalysis`). This module owns the prompt, the
//! tolerant parsing and the neutral fallback; the lexicon scorer never depends on it.
//!
//! Clients are built from an explicit `AiConfig`; there is no global client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AiConfig;

pub const NEUTRAL_SCORE: u8 = 50;
pub const FALLBACK_ANALYSIS: &str = "We encountered an issue while generating a full discernment analysis for this title. Please try again later, or use prayerful wisdom and biblical principles as you decide whether to watch or read this content.";

const SYSTEM_PROMPT: &str = "You are a careful, concise Christian media discernment assistant. You speak with truth and grace.";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// What the caller wants analysed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub title: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default)]
    pub release_year: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

fn default_media_type() -> String {
    "movie".to_string()
}

impl MediaRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            media_type: default_media_type(),
            release_year: None,
            overview: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub title: String,
    pub reason: String,
}

/// Model verdict, passed through to the caller unchanged by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscernmentAnalysis {
    pub discernment_score: u8,
    pub faith_analysis: String,
    pub tags: Vec<String>,
    pub verse_text: String,
    pub verse_reference: String,
    pub alternatives: Vec<Alternative>,
}

impl DiscernmentAnalysis {
    /// Neutral result returned whenever the provider cannot produce one.
    pub fn fallback() -> Self {
        Self {
            discernment_score: NEUTRAL_SCORE,
            faith_analysis: FALLBACK_ANALYSIS.to_string(),
            tags: vec!["analysis-error".to_string()],
            verse_text: String::new(),
            verse_reference: String::new(),
            alternatives: Vec::new(),
        }
    }
}

/// Trait object used by handlers/tests. Never fails: errors become `fallback()`.
pub trait MediaAnalyzer: Send + Sync {
    fn analyze<'a>(
        &'a self,
        req: &'a MediaRequest,
    ) -> Pin<Box<dyn Future<Output = DiscernmentAnalysis> + Send + 'a>>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynMediaAnalyzer = Arc<dyn MediaAnalyzer>;

/// Factory: build an analyzer according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock analyzer.
/// * Else if `config.enabled == false`, returns a disabled analyzer (always fallback).
/// * Else builds the configured provider.
pub fn build_analyzer(config: &AiConfig) -> DynMediaAnalyzer {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(FallbackAnalyzer::new(MockProvider::default()));
    }

    if !config.enabled {
        return Arc::new(DisabledAnalyzer);
    }

    match config.provider.as_str() {
        "openai" => match OpenAiProvider::new(config) {
            Ok(p) => Arc::new(FallbackAnalyzer::new(p)),
            Err(e) => {
                warn!(error = %e, "OpenAI provider unavailable; AI disabled");
                Arc::new(DisabledAnalyzer)
            }
        },
        other => {
            warn!(provider = other, "unsupported AI provider; AI disabled");
            Arc::new(DisabledAnalyzer)
        }
    }
}

/// Prompt sent to the model for one title.
pub fn build_prompt(req: &MediaRequest) -> String {
    let is_book = req.media_type.eq_ignore_ascii_case("book");
    let mut context = format!("\"{}\" (a {}", req.title, req.media_type);
    if let Some(year) = req.release_year.as_deref().filter(|y| !y.trim().is_empty()) {
        let verb = if is_book { "published" } else { "released" };
        context.push_str(&format!(", {verb} {year}"));
    }
    context.push(')');
    if let Some(overview) = req.overview.as_deref().filter(|o| !o.trim().is_empty()) {
        let label = if is_book { "Synopsis" } else { "Plot Summary" };
        context.push_str(&format!("\n\n{label}: {overview}"));
    }

    format!(
        r#"You are a Christian media discernment expert. Analyze {context} and provide
a concise assessment from a biblical worldview.

Return your answer as **valid JSON** ONLY, with this exact shape:

{{
  "discernmentScore": <number 0-100>,
  "faithAnalysis": "<2 short paragraphs, max 4-5 sentences total>",
  "tags": ["<short tag>", "..."],
  "verseText": "<Bible verse text>",
  "verseReference": "<Book chapter:verse>",
  "alternatives": [
    {{ "title": "<title>", "reason": "<1 short sentence (max 15 words)>" }}
  ]
}}

Scoring guide:
- 85-100: Faith-safe / uplifting / aligns with Christian values
- 65-84: Mixed / some concerns / use caution
- 0-64: Significant concern / not recommended for believers

In "faithAnalysis":
- Briefly highlight any occult, sexual, violent, or anti-biblical content.
- Then give clear, pastoral guidance for Christians (no fear-mongering)."#
    )
}

/// Tolerant parse of the model's JSON content. Missing fields take neutral defaults;
/// `None` only when the content is not a JSON object at all.
pub fn parse_analysis(raw: &str) -> Option<DiscernmentAnalysis> {
    let v: Value = serde_json::from_str(raw.trim()).ok()?;
    let obj = v.as_object()?;

    let text = |key: &str| -> String {
        match obj.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    };

    let score = match obj.get("discernmentScore") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .map(|s| s.round().clamp(0.0, 100.0) as u8)
    .unwrap_or(NEUTRAL_SCORE);

    let faith_analysis = match text("faithAnalysis") {
        s if s.is_empty() => "No analysis was provided.".to_string(),
        s => s,
    };

    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|t| match t {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let alternatives = obj
        .get("alternatives")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|alt| {
                    let field = |k: &str| {
                        alt.get(k)
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string()
                    };
                    Alternative {
                        title: field("title"),
                        reason: field("reason"),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Some(DiscernmentAnalysis {
        discernment_score: score,
        faith_analysis,
        tags,
        verse_text: text("verseText"),
        verse_reference: text("verseReference"),
        alternatives,
    })
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: returns the raw JSON content produced by the model.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// OpenAI provider (Chat Completions, JSON response format).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("OpenAI api key is not configured");
        }
        let http = reqwest::Client::builder()
            .user_agent("discernment-engine/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct ResponseFormat {
                #[serde(rename = "type")]
                kind: &'static str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                response_format: ResponseFormat,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Msg {
                        role: "user",
                        content: prompt,
                    },
                ],
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            };

            let resp = match self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "OpenAI request failed");
                    return None;
                }
            };

            if !resp.status().is_success() {
                warn!(status = %resp.status(), "OpenAI returned an error status");
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            fixed: r#"{"discernmentScore":72,"faithAnalysis":"Mixed themes (mock).","tags":["mock"],"verseText":"","verseReference":"","alternatives":[]}"#.to_string(),
        }
    }
}

impl Provider for MockProvider {
    fn fetch<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Wraps a provider: prompt → fetch → tolerant parse → fallback on any failure.
pub struct FallbackAnalyzer<P: Provider> {
    inner: P,
}

impl<P: Provider> FallbackAnalyzer<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    async fn analyze_impl(&self, req: &MediaRequest) -> DiscernmentAnalysis {
        info!(
            provider = self.inner.name(),
            media_type = %req.media_type,
            year = req.release_year.as_deref().unwrap_or("N/A"),
            "analyzing media"
        );
        let prompt = build_prompt(req);
        let Some(raw) = self.inner.fetch(&prompt).await else {
            return DiscernmentAnalysis::fallback();
        };
        match parse_analysis(&raw) {
            Some(a) => a,
            None => {
                warn!(provider = self.inner.name(), "model returned malformed JSON");
                DiscernmentAnalysis::fallback()
            }
        }
    }
}

impl<P: Provider> MediaAnalyzer for FallbackAnalyzer<P> {
    fn analyze<'a>(
        &'a self,
        req: &'a MediaRequest,
    ) -> Pin<Box<dyn Future<Output = DiscernmentAnalysis> + Send + 'a>> {
        Box::pin(self.analyze_impl(req))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Always returns the neutral fallback; used when AI is disabled.
pub struct DisabledAnalyzer;

impl MediaAnalyzer for DisabledAnalyzer {
    fn analyze<'a>(
        &'a self,
        _req: &'a MediaRequest,
    ) -> Pin<Box<dyn Future<Output = DiscernmentAnalysis> + Send + 'a>> {
        Box::pin(async { DiscernmentAnalysis::fallback() })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
