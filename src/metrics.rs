use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::profile::Condition;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process. Later calls reuse the
    /// first handle; `None` means another recorder was already installed.
    pub fn init() -> Option<Self> {
        HANDLE
            .get_or_init(|| PrometheusBuilder::new().install_recorder().ok())
            .clone()
            .map(|handle| Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
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

pub(crate) fn record_assessment(condition: Condition, source: &'static str, final_percentage: f64) {
    counter!(
        "risk_assessments_total",
        "condition" => condition.as_str(),
        "source" => source
    )
    .increment(1);
    histogram!("risk_final_percentage", "condition" => condition.as_str()).record(final_percentage);
}

pub(crate) fn record_model_failure(condition: Condition) {
    counter!("risk_model_failures_total", "condition" => condition.as_str()).increment(1);
}

pub(crate) fn record_rejected(condition: Condition, kind: &'static str) {
    counter!(
        "risk_assessment_rejected_total",
        "condition" => condition.as_str(),
        "kind" => kind
    )
    .increment(1);
}
