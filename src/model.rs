//! Probability model collaborator: trait + concrete models.
//!
//! The scorer does not own model training or artifact formats. It hands over a
//! feature vector and reads back a probability in [0, 1]. Any error, or a
//! value outside that range, sends the assessment down the rule-only path.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Synchronous classifier returning the positive-class probability.
pub trait ProbabilityModel: Send + Sync {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Model name for diagnostics and logs.
    fn name(&self) -> &str;
}

/// Convenient alias used by callers.
pub type DynModel = Arc<dyn ProbabilityModel>;

/// Call the model and reject non-finite or out-of-range output.
pub fn checked_probability(model: &dyn ProbabilityModel, features: &[f64]) -> Result<f64, ModelError> {
    let p = model.predict_probability(features)?;
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ModelError::OutOfRange(p))
    }
}

/// Logistic regression: `sigmoid(intercept + Σ coef_i * x_i)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

fn default_model_name() -> String {
    "logistic".to_string()
}

impl LogisticModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            name: default_model_name(),
            intercept,
            coefficients,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }
}

impl ProbabilityModel for LogisticModel {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::FeatureCount {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        if !z.is_finite() {
            return Err(ModelError::Inference(format!("non-finite logit {z}")));
        }
        Ok(sigmoid(z))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Returns the same probability for every input; used for tests and local runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedModel {
    pub probability: f64,
}

impl ProbabilityModel for FixedModel {
    fn predict_probability(&self, _features: &[f64]) -> Result<f64, ModelError> {
        Ok(self.probability)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Always unavailable; stands in when a condition has no model configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

impl ProbabilityModel for DisabledModel {
    fn predict_probability(&self, _features: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::Unavailable)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
