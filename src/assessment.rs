//! # Assessment pipeline
//! Pure mapping `(profile, answers, model?)` → `RiskAssessment`.
//!
//! Order:
//! 1) validate answers and resolve ranks
//! 2) raw score, normalized rule percentage, escalation rules
//! 3) optional model blend (failure degrades to rule-only, visibly)
//! 4) band: the fired override rule, else the profile's band table

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::blend::BlendOutcome;
use crate::error::ScoreError;
use crate::metrics;
use crate::model::{checked_probability, DynModel, ProbabilityModel};
use crate::profile::{AssessmentProfile, Condition};
use crate::scoring::{apply_escalations, normalize, AssessmentInput};
use crate::telemetry::anon_id;

/// Whether the final percentage came through the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Blended,
    RuleOnly,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreSource::Blended => "blended",
            ScoreSource::RuleOnly => "rule_only",
        }
    }
}

/// Verdict handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub condition: Condition,
    pub raw_score: f64,
    pub max_score: f64,
    /// Rule-based percentage after escalations.
    pub rule_percentage: f64,
    pub final_percentage: f64,
    pub band: String,
    pub guidance: String,
    pub source: ScoreSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_probability: Option<f64>,
    /// Label of the override rule that fired, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// `(percentage, band_label, guidance_text)`.
    pub fn verdict(&self) -> (f64, &str, &str) {
        (self.final_percentage, &self.band, &self.guidance)
    }

    pub fn is_blended(&self) -> bool {
        self.source == ScoreSource::Blended
    }
}

/// A profile bound to an optional model.
#[derive(Clone)]
pub struct Assessor {
    profile: Arc<AssessmentProfile>,
    model: Option<DynModel>,
}

impl Assessor {
    pub fn new(profile: AssessmentProfile) -> Self {
        Self {
            profile: Arc::new(profile),
            model: None,
        }
    }

    pub fn with_model(mut self, model: DynModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn profile(&self) -> &AssessmentProfile {
        &self.profile
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    pub fn assess(&self, input: &AssessmentInput) -> Result<RiskAssessment, ScoreError> {
        assess(&self.profile, input, self.model.as_deref())
    }
}

/// Score `input` against `profile`, consulting `model` when given.
pub fn assess(
    profile: &AssessmentProfile,
    input: &AssessmentInput,
    model: Option<&dyn ProbabilityModel>,
) -> Result<RiskAssessment, ScoreError> {
    let condition = profile.condition();
    let id = anon_id(input);

    let ranks = profile.ranks(input).inspect_err(|e| {
        metrics::record_rejected(condition, e.kind());
        warn!(%condition, %id, error = %e, "assessment rejected");
    })?;

    let raw_score = profile.raw_score(&ranks);
    let max_score = profile.max_score();
    let base = normalize(raw_score, max_score);
    let (rule_percentage, escalations) = apply_escalations(base, &ranks, profile.escalations());
    if !escalations.is_empty() {
        debug!(%condition, %id, base, rule_percentage, fired = ?escalations, "escalation applied");
    }

    let mut model_probability = None;
    let mut model_error = None;
    let mut override_rule = None;
    let mut source = ScoreSource::RuleOnly;
    let mut final_percentage = rule_percentage;

    if let Some(m) = model {
        let features = profile.feature_vector(&ranks, rule_percentage);
        match checked_probability(m, &features) {
            Ok(p) => {
                let BlendOutcome {
                    final_percentage: blended,
                    rule,
                } = profile.overrides().blend(rule_percentage, p);
                model_probability = Some(p);
                final_percentage = blended;
                override_rule = rule.cloned();
                source = ScoreSource::Blended;
            }
            Err(e) => {
                metrics::record_model_failure(condition);
                warn!(%condition, %id, model = m.name(), error = %e, "model failed; using rule-only score");
                model_error = Some(e.to_string());
            }
        }
    }

    let (band, guidance) = match &override_rule {
        Some(rule) => (rule.label.clone(), rule.guidance.clone()),
        None => {
            let b = profile.bands().classify(final_percentage);
            (b.label.clone(), b.guidance.clone())
        }
    };

    metrics::record_assessment(condition, source.as_str(), final_percentage);
    info!(
        %condition, %id,
        raw_score, rule_percentage, final_percentage,
        band = %band, source = source.as_str(),
        "assessment scored"
    );

    Ok(RiskAssessment {
        condition,
        raw_score,
        max_score,
        rule_percentage,
        final_percentage,
        band,
        guidance,
        source,
        model_probability,
        override_rule: override_rule.map(|r| r.label),
        escalations,
        model_error,
        assessed_at: Utc::now(),
    })
}
