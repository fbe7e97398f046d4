//! Typed errors for scoring, profile construction and the model collaborator.
//!
//! Scoring errors mean the caller handed over a malformed answer map. They are
//! never defaulted: a guessed rank would corrupt the risk signal.

use thiserror::Error;

/// Answer-map contract violations raised while scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("label '{label}' is not part of scale [{scale}]")]
    InvalidLabel { label: String, scale: String },

    #[error("missing answer for symptom '{0}'")]
    MissingSymptom(String),

    #[error("unknown symptom '{0}'")]
    UnknownSymptom(String),
}

impl ScoreError {
    /// Stable machine-readable kind, used in API error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::InvalidLabel { .. } => "invalid_label",
            ScoreError::MissingSymptom(_) => "missing_symptom",
            ScoreError::UnknownSymptom(_) => "unknown_symptom",
        }
    }
}

/// Violations of the static invariants of scales, bands, weights and rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scale needs at least two labels, got {0}")]
    ScaleTooShort(usize),

    #[error("duplicate label '{0}' in scale")]
    DuplicateLabel(String),

    #[error("weight for '{symptom}' must be positive and finite, got {weight}")]
    InvalidWeight { symptom: String, weight: f64 },

    #[error("duplicate symptom '{0}' in profile")]
    DuplicateSymptom(String),

    #[error("band table is empty")]
    NoBands,

    #[error("lowest band must start at 0, starts at {0}")]
    BandsDoNotStartAtZero(f64),

    #[error("band thresholds must strictly increase ('{0}' breaks the order)")]
    BandsNotIncreasing(String),

    #[error("band '{label}' threshold {threshold} is outside [0, 100]")]
    BandOutOfRange { label: String, threshold: f64 },

    #[error("rule '{rule}' references unknown symptom '{symptom}'")]
    RuleUnknownSymptom { rule: String, symptom: String },

    #[error("rule '{rule}' requires rank {rank} but '{symptom}' only has {len} labels")]
    RuleRankOutOfScale {
        rule: String,
        symptom: String,
        rank: usize,
        len: usize,
    },

    #[error("override rule '{0}' has a non-finite or out-of-range parameter")]
    InvalidOverride(String),

    #[error("escalation rule '{rule}' multiplier must be positive and finite, got {multiplier}")]
    InvalidEscalation { rule: String, multiplier: f64 },

    #[error("model expects {expected} coefficients, profile yields {actual} features")]
    ModelShape { expected: usize, actual: usize },
}

/// Failures of the external probability model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("no model available")]
    Unavailable,

    #[error("model expects {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model returned out-of-range probability {0}")]
    OutOfRange(f64),

    #[error("model inference failed: {0}")]
    Inference(String),
}
