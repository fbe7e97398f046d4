// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod assessment;
pub mod bands;
pub mod blend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod profile;
pub mod scale;
pub mod scoring;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::assessment::{assess, Assessor, RiskAssessment, ScoreSource};
pub use crate::bands::{classify, BandTable, RiskBand};
pub use crate::blend::{blend_with_model, OverrideRule, OverrideSet};
pub use crate::config::AppConfig;
pub use crate::error::{ConfigError, ModelError, ScoreError};
pub use crate::model::{DisabledModel, DynModel, FixedModel, LogisticModel, ProbabilityModel};
pub use crate::profile::{AssessmentProfile, Condition, Symptom};
pub use crate::scale::{rank, SeverityScale};
pub use crate::scoring::{max_possible, normalize, score, AssessmentInput, SymptomWeights};

/// Build the full in-process app from the environment (config files, test mode).
/// Used by the Shuttle entrypoint and by integration tests.
pub fn app() -> anyhow::Result<axum::Router> {
    let cfg = AppConfig::from_env()?;
    Ok(create_router(&cfg))
}
