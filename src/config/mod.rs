// src/config/mod.rs
//! Runtime configuration loaded from `config/` (paths overridable via env).

pub mod ai;
pub mod engine;

pub use ai::AiConfig;
pub use engine::EngineConfig;
