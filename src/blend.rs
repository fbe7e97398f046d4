//! Model blend with threshold-triggered overrides.
//!
//! Rules are kept sorted by descending threshold. The first rule with
//! `rule_percentage >= threshold` wins and produces
//! `clamp(max(p * 100 * multiplier, floor), 0, ceiling)`.
//! Without a matching rule the model probability passes through as a percentage.

use crate::error::ConfigError;
use crate::scoring::clamp_percentage;
use serde::{Deserialize, Serialize};

fn default_ceiling() -> f64 {
    100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Band label shown when the rule fires (e.g. "Emergency").
    pub label: String,
    /// Inclusive threshold on the rule-based percentage.
    pub threshold: f64,
    pub multiplier: f64,
    /// Minimum final percentage once the rule fires.
    #[serde(default)]
    pub floor: f64,
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
    #[serde(default)]
    pub guidance: String,
}

impl OverrideRule {
    pub fn new(label: impl Into<String>, threshold: f64, multiplier: f64, floor: f64) -> Self {
        Self {
            label: label.into(),
            threshold,
            multiplier,
            floor,
            ceiling: default_ceiling(),
            guidance: String::new(),
        }
    }

    pub fn ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    /// Final percentage for a model probability in [0, 1].
    pub fn apply(&self, model_probability: f64) -> f64 {
        let amplified = (model_probability * 100.0 * self.multiplier).max(self.floor);
        clamp_percentage(amplified).min(self.ceiling)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.threshold, self.multiplier, self.floor, self.ceiling]
            .iter()
            .all(|x| x.is_finite());
        let ranged = self.multiplier >= 0.0
            && (0.0..=100.0).contains(&self.threshold)
            && (0.0..=100.0).contains(&self.floor)
            && (0.0..=100.0).contains(&self.ceiling)
            && self.floor <= self.ceiling;
        if finite && ranged {
            Ok(())
        } else {
            Err(ConfigError::InvalidOverride(self.label.clone()))
        }
    }
}

/// Override rules ordered from most to least severe threshold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<OverrideRule>", into = "Vec<OverrideRule>")]
pub struct OverrideSet {
    rules: Vec<OverrideRule>,
}

impl OverrideSet {
    pub fn new(mut rules: Vec<OverrideRule>) -> Result<Self, ConfigError> {
        for r in &rules {
            r.validate()?;
        }
        rules.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Most severe rule whose threshold the rule percentage reaches.
    pub fn select(&self, rule_percentage: f64) -> Option<&OverrideRule> {
        self.rules.iter().find(|r| rule_percentage >= r.threshold)
    }

    /// Blend and report which rule (if any) fired.
    pub fn blend(&self, rule_percentage: f64, model_probability: f64) -> BlendOutcome<'_> {
        match self.select(rule_percentage) {
            Some(rule) => BlendOutcome {
                final_percentage: rule.apply(model_probability),
                rule: Some(rule),
            },
            None => BlendOutcome {
                final_percentage: clamp_percentage(model_probability * 100.0),
                rule: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendOutcome<'a> {
    pub final_percentage: f64,
    pub rule: Option<&'a OverrideRule>,
}

/// Final percentage for `rule_percentage` and a model probability in [0, 1].
pub fn blend_with_model(rule_percentage: f64, model_probability: f64, overrides: &OverrideSet) -> f64 {
    overrides
        .blend(rule_percentage, model_probability)
        .final_percentage
}

impl TryFrom<Vec<OverrideRule>> for OverrideSet {
    type Error = ConfigError;

    fn try_from(rules: Vec<OverrideRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<OverrideSet> for Vec<OverrideRule> {
    fn from(s: OverrideSet) -> Self {
        s.rules
    }
}
