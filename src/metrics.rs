// src/metrics.rs
//! Prometheus exposition. Counters are recorded through the `metrics` facade, so
//! library users without an installed recorder pay nothing.

use std::sync::OnceLock;

use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::warn;

use crate::analyze::Hit;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process.
    /// `None` if another recorder was installed first.
    pub fn init() -> Option<Self> {
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => Some(h),
                Err(e) => {
                    warn!(error = %e, "prometheus: recorder not installed");
                    None
                }
            })
            .clone()?;
        Some(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One finished analysis: total score and every rule that fired.
pub fn record_analysis(total: u8, hits: &[Hit]) {
    counter!("discernment_analyses_total").increment(1);
    histogram!("discernment_total_score").record(f64::from(total));
    for h in hits {
        counter!("discernment_rule_hits_total", "rule" => h.rule_id.clone()).increment(1);
    }
}
