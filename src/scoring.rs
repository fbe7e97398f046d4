//! Weighted ordinal scoring.
//!
//! raw score  = Σ weight[s] * rank(answer[s])
//! max score  = Σ weight[s] * (len(scale) - 1)
//! percentage = raw / max * 100, clamped to [0, 100]
//!
//! Escalation rules multiply the percentage when a set of symptoms are all at
//! or above given ranks. The result is clamped again.

use crate::error::ScoreError;
use crate::scale::SeverityScale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symptom → selected label.
pub type AssessmentInput = BTreeMap<String, String>;

/// Symptom → clinical weight.
pub type SymptomWeights = BTreeMap<String, f64>;

/// Weighted sum over every symptom in `weights`, all answered on `scale`.
/// Keys in `inputs` that have no weight are ignored here.
pub fn score(
    inputs: &AssessmentInput,
    weights: &SymptomWeights,
    scale: &SeverityScale,
) -> Result<f64, ScoreError> {
    let mut total = 0.0;
    for (symptom, weight) in weights {
        let label = inputs
            .get(symptom)
            .ok_or_else(|| ScoreError::MissingSymptom(symptom.clone()))?;
        total += weight * scale.rank(label)? as f64;
    }
    Ok(total)
}

/// Highest raw score reachable with `weights` on a single scale.
pub fn max_possible(weights: &SymptomWeights, scale: &SeverityScale) -> f64 {
    weights.values().map(|w| w * scale.max_rank() as f64).sum()
}

/// Rescale a raw score into [0, 100].
pub fn normalize(raw_score: f64, max_possible: f64) -> f64 {
    if max_possible.is_nan() || max_possible <= 0.0 || !raw_score.is_finite() {
        return 0.0;
    }
    clamp_percentage(raw_score / max_possible * 100.0)
}

/// Clamp to [0, 100]; NaN maps to 0.
pub fn clamp_percentage(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 100.0)
    }
}

/// A single `symptom >= rank` condition of an escalation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankAtLeast {
    pub symptom: String,
    pub min_rank: usize,
}

/// Multiplies the rule percentage when every condition in `all_of` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRule {
    pub name: String,
    pub all_of: Vec<RankAtLeast>,
    pub multiplier: f64,
}

impl EscalationRule {
    pub fn matches(&self, ranks: &BTreeMap<String, usize>) -> bool {
        !self.all_of.is_empty()
            && self
                .all_of
                .iter()
                .all(|c| ranks.get(&c.symptom).is_some_and(|r| *r >= c.min_rank))
    }
}

/// Apply every matching rule in order. Returns the clamped percentage and the
/// names of the rules that fired.
pub fn apply_escalations(
    percentage: f64,
    ranks: &BTreeMap<String, usize>,
    rules: &[EscalationRule],
) -> (f64, Vec<String>) {
    let mut out = percentage;
    let mut fired = Vec::new();
    for rule in rules {
        if rule.matches(ranks) {
            out = clamp_percentage(out * rule.multiplier);
            fired.push(rule.name.clone());
        }
    }
    (clamp_percentage(out), fired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diabetes_weights() -> SymptomWeights {
        [
            ("thirst", 8.0),
            ("hunger", 7.0),
            ("vision", 9.0),
            ("wounds", 10.0),
            ("fatigue", 5.0),
            ("tingling", 6.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn answer_all(weights: &SymptomWeights, label: &str) -> AssessmentInput {
        weights
            .keys()
            .map(|k| (k.clone(), label.to_string()))
            .collect()
    }

    #[test]
    fn all_always_reaches_max() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let raw = score(&answer_all(&w, "Always"), &w, &s).unwrap();
        let max = max_possible(&w, &s);
        assert_eq!(raw, 180.0);
        assert_eq!(max, 180.0);
        assert_eq!(normalize(raw, max), 100.0);
    }

    #[test]
    fn all_never_scores_zero() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let raw = score(&answer_all(&w, "Never"), &w, &s).unwrap();
        assert_eq!(raw, 0.0);
        assert_eq!(normalize(raw, max_possible(&w, &s)), 0.0);
    }

    #[test]
    fn mixed_answers_weight_each_rank() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let mut input = answer_all(&w, "Never");
        input.insert("wounds".into(), "Often".into()); // 10 * 3
        input.insert("thirst".into(), "Rarely".into()); // 8 * 1
        assert_eq!(score(&input, &w, &s).unwrap(), 38.0);
    }

    #[test]
    fn missing_symptom_fails() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let mut input = answer_all(&w, "Often");
        input.remove("vision");
        assert_eq!(
            score(&input, &w, &s),
            Err(ScoreError::MissingSymptom("vision".into()))
        );
    }

    #[test]
    fn invalid_label_fails() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let mut input = answer_all(&w, "Often");
        input.insert("hunger".into(), "Constantly".into());
        assert!(matches!(
            score(&input, &w, &s),
            Err(ScoreError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn score_is_pure() {
        let w = diabetes_weights();
        let s = SeverityScale::frequency();
        let input = answer_all(&w, "Sometimes");
        assert_eq!(score(&input, &w, &s), score(&input, &w, &s));
    }

    #[test]
    fn normalize_clamps_and_guards_zero_max() {
        assert_eq!(normalize(250.0, 200.0), 100.0);
        assert_eq!(normalize(-5.0, 200.0), 0.0);
        assert_eq!(normalize(10.0, 0.0), 0.0);
        assert_eq!(normalize(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn escalation_requires_all_conditions() {
        let rule = EscalationRule {
            name: "severe_and_unclear".into(),
            all_of: vec![
                RankAtLeast { symptom: "severity".into(), min_rank: 3 },
                RankAtLeast { symptom: "clarity".into(), min_rank: 3 },
            ],
            multiplier: 1.2,
        };
        let mut ranks = BTreeMap::from([("severity".to_string(), 3), ("clarity".to_string(), 2)]);
        let (p, fired) = apply_escalations(50.0, &ranks, std::slice::from_ref(&rule));
        assert_eq!(p, 50.0);
        assert!(fired.is_empty());

        ranks.insert("clarity".into(), 4);
        let (p, fired) = apply_escalations(50.0, &ranks, std::slice::from_ref(&rule));
        assert!((p - 60.0).abs() < 1e-9);
        assert_eq!(fired, vec!["severe_and_unclear".to_string()]);

        let (p, _) = apply_escalations(95.0, &ranks, &[rule]);
        assert_eq!(p, 100.0);
    }
}
