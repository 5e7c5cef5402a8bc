//! Debug endpoints: inspect loaded rules and preview extracted signals.
//! Mounted by `api::router` only when `DEBUG_ROUTES=1`.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::scoring::recognized_rule_ids;
use crate::api::AppState;
use crate::normalize::normalize;
use crate::signals::{extract, Signals};

#[derive(Debug, Serialize)]
pub struct RuleOut {
    pub id: String,
    pub weight: f64,
    pub recognized: bool,
}

#[derive(Debug, Serialize)]
pub struct RulesOut {
    pub path: String,
    pub count: usize,
    pub rules: Vec<RuleOut>,
    pub recognized_ids: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewIn {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewOut {
    pub normalized: String,
    pub signals: Signals,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/debug/rules", get(get_rules))
        .route("/debug/signals", post(preview_signals))
}

async fn get_rules(State(state): State<AppState>) -> Json<RulesOut> {
    let set = state.rules.current();
    let known = recognized_rule_ids();
    let rules = set
        .rules
        .iter()
        .map(|r| RuleOut {
            id: r.id.clone(),
            weight: r.weight,
            recognized: known.iter().any(|k| *k == r.id),
        })
        .collect::<Vec<_>>();
    Json(RulesOut {
        path: state.rules.path().display().to_string(),
        count: rules.len(),
        rules,
        recognized_ids: known,
    })
}

async fn preview_signals(
    State(state): State<AppState>,
    Json(body): Json<PreviewIn>,
) -> Json<PreviewOut> {
    let normalized = normalize(&body.text);
    let signals = extract(&normalized, &state.lexicon);
    Json(PreviewOut {
        normalized,
        signals,
    })
}
