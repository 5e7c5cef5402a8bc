// src/config/engine.rs
//! Engine settings from `config/discernment.toml`.
//!
//! ```toml
//! [scoring]
//! baseline = 50
//!
//! [calibration]
//! cap = 30
//! floor = 80
//!
//! [lexicon]
//! path = "config/lexicon.toml"   # optional; built-in lexicon otherwise
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyze::calibrate::{CalibrationBands, DEFAULT_CAP, DEFAULT_FLOOR};
use crate::analyze::scoring::NEUTRAL_BASELINE;
use crate::lexicon::Lexicon;

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/discernment.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "DISCERN_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub calibration: CalibrationSection,
    #[serde(default)]
    pub lexicon: LexiconSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    #[serde(default = "default_baseline")]
    pub baseline: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationSection {
    #[serde(default = "default_cap")]
    pub cap: u8,
    #[serde(default = "default_floor")]
    pub floor: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LexiconSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_baseline() -> i32 {
    NEUTRAL_BASELINE
}
fn default_cap() -> u8 {
    DEFAULT_CAP
}
fn default_floor() -> u8 {
    DEFAULT_FLOOR
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
        }
    }
}

impl Default for CalibrationSection {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            floor: default_floor(),
        }
    }
}

impl EngineConfig {
    /// Load from `DISCERN_CONFIG_PATH` or `config/discernment.toml`.
    /// A missing file yields defaults; an unreadable or invalid one is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_ENGINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH));
        if !path.exists() {
            info!(path = %path.display(), "engine config not found; using defaults");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read engine config at {}: {}",
                path.display(),
                e
            )
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: EngineConfig = toml::from_str(toml_str)?;
        cfg.validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        let CalibrationSection { cap, floor } = self.calibration;
        if cap > 100 || floor > 100 {
            anyhow::bail!("calibration bands must be within 0..=100 (cap {cap}, floor {floor})");
        }
        if cap > floor {
            anyhow::bail!("calibration cap ({cap}) must not exceed floor ({floor})");
        }
        Ok(self)
    }

    pub fn bands(&self) -> CalibrationBands {
        CalibrationBands {
            cap: self.calibration.cap,
            floor: self.calibration.floor,
        }
    }

    pub fn baseline(&self) -> i32 {
        self.scoring.baseline
    }

    /// The configured lexicon, or the built-in one when no path is set.
    pub fn load_lexicon(&self) -> anyhow::Result<Lexicon> {
        match &self.lexicon.path {
            Some(p) => Lexicon::from_path(p),
            None => Ok(Lexicon::builtin().clone()),
        }
    }
}
