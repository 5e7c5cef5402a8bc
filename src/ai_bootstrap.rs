// src/ai_bootstrap.rs
use crate::config::ai::AiConfig;
use crate::media_ai::{build_analyzer, DynMediaAnalyzer, MediaRequest};
use tracing::{info, warn};

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub analyzer: DynMediaAnalyzer,
}

impl AiRuntime {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let cfg = AiConfig::load_from_file(path)?;
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "AI cfg loaded: provider={}, model={}, enabled={}, key_len={}",
            cfg.provider,
            cfg.model,
            cfg.enabled,
            cfg.api_key.len()
        );
        let analyzer = build_analyzer(&cfg);
        Ok(Self { cfg, analyzer })
    }

    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("AI quick_probe skipped: AI is disabled in config");
            return;
        }
        let sample = MediaRequest::new("The Chosen");
        let out = self.analyzer.analyze(&sample).await;
        info!(
            provider = self.analyzer.provider_name(),
            score = out.discernment_score,
            tags = ?out.tags,
            "AI quick_probe finished"
        );
    }
}
