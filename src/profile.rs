//! Assessment profiles: one configurable scoring engine per condition.
//!
//! A profile owns its questions (each with a weight and a scale), its band
//! table, model override rules and escalation rules. Profiles are validated on
//! construction and never mutated afterwards.

use crate::bands::{BandTable, RiskBand};
use crate::blend::{OverrideRule, OverrideSet};
use crate::error::{ConfigError, ScoreError};
use crate::scale::SeverityScale;
use crate::scoring::{AssessmentInput, EscalationRule, RankAtLeast, SymptomWeights};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Diabetes,
    Heart,
    Parkinsons,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Diabetes, Condition::Heart, Condition::Parkinsons];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Diabetes => "diabetes",
            Condition::Heart => "heart",
            Condition::Parkinsons => "parkinsons",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    /// Accepts the canonical key plus a few dashed/apostrophe spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match norm.as_str() {
            "diabetes" => Ok(Condition::Diabetes),
            "heart" | "heartdisease" => Ok(Condition::Heart),
            "parkinsons" | "parkinson" => Ok(Condition::Parkinsons),
            _ => Err(format!("unknown condition '{s}'")),
        }
    }
}

/// One question of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub key: String,
    pub question: String,
    pub weight: f64,
    pub scale: SeverityScale,
}

impl Symptom {
    pub fn new(
        key: impl Into<String>,
        question: impl Into<String>,
        weight: f64,
        scale: SeverityScale,
    ) -> Self {
        Self {
            key: key.into(),
            question: question.into(),
            weight,
            scale,
        }
    }
}

/// Serialized shape of a profile; validated into [`AssessmentProfile`].
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDef {
    pub condition: Condition,
    pub title: String,
    pub symptoms: Vec<Symptom>,
    #[serde(default = "BandTable::standard")]
    pub bands: BandTable,
    #[serde(default)]
    pub overrides: OverrideSet,
    #[serde(default)]
    pub escalations: Vec<EscalationRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileDef")]
pub struct AssessmentProfile {
    condition: Condition,
    title: String,
    symptoms: Vec<Symptom>,
    bands: BandTable,
    overrides: OverrideSet,
    escalations: Vec<EscalationRule>,
}

impl TryFrom<ProfileDef> for AssessmentProfile {
    type Error = ConfigError;

    fn try_from(d: ProfileDef) -> Result<Self, Self::Error> {
        Self::new(d.condition, d.title, d.symptoms, d.bands, d.overrides, d.escalations)
    }
}

impl AssessmentProfile {
    pub fn new(
        condition: Condition,
        title: impl Into<String>,
        symptoms: Vec<Symptom>,
        bands: BandTable,
        overrides: OverrideSet,
        escalations: Vec<EscalationRule>,
    ) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for s in &symptoms {
            if !(s.weight.is_finite() && s.weight > 0.0) {
                return Err(ConfigError::InvalidWeight {
                    symptom: s.key.clone(),
                    weight: s.weight,
                });
            }
            if !seen.insert(s.key.as_str()) {
                return Err(ConfigError::DuplicateSymptom(s.key.clone()));
            }
        }
        for rule in &escalations {
            if !(rule.multiplier.is_finite() && rule.multiplier > 0.0) {
                return Err(ConfigError::InvalidEscalation {
                    rule: rule.name.clone(),
                    multiplier: rule.multiplier,
                });
            }
            for c in &rule.all_of {
                let symptom = symptoms.iter().find(|s| s.key == c.symptom).ok_or_else(|| {
                    ConfigError::RuleUnknownSymptom {
                        rule: rule.name.clone(),
                        symptom: c.symptom.clone(),
                    }
                })?;
                if c.min_rank > symptom.scale.max_rank() {
                    return Err(ConfigError::RuleRankOutOfScale {
                        rule: rule.name.clone(),
                        symptom: c.symptom.clone(),
                        rank: c.min_rank,
                        len: symptom.scale.len(),
                    });
                }
            }
        }
        Ok(Self {
            condition,
            title: title.into(),
            symptoms,
            bands,
            overrides,
            escalations,
        })
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn symptom(&self, key: &str) -> Option<&Symptom> {
        self.symptoms.iter().find(|s| s.key == key)
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    pub fn escalations(&self) -> &[EscalationRule] {
        &self.escalations
    }

    pub fn weights(&self) -> SymptomWeights {
        self.symptoms
            .iter()
            .map(|s| (s.key.clone(), s.weight))
            .collect()
    }

    /// Σ weight * (len(scale) - 1), each symptom on its own scale.
    pub fn max_score(&self) -> f64 {
        self.symptoms
            .iter()
            .map(|s| s.weight * s.scale.max_rank() as f64)
            .sum()
    }

    /// Validate the answer map and resolve every answer to its rank.
    /// Missing answers and foreign labels fail first, then unknown keys.
    pub fn ranks(&self, input: &AssessmentInput) -> Result<BTreeMap<String, usize>, ScoreError> {
        let mut ranks = BTreeMap::new();
        for s in &self.symptoms {
            let label = input
                .get(&s.key)
                .ok_or_else(|| ScoreError::MissingSymptom(s.key.clone()))?;
            ranks.insert(s.key.clone(), s.scale.rank(label)?);
        }
        if let Some(extra) = input.keys().find(|k| !ranks.contains_key(k.as_str())) {
            return Err(ScoreError::UnknownSymptom(extra.clone()));
        }
        Ok(ranks)
    }

    /// Σ weight * rank over resolved ranks.
    pub fn raw_score(&self, ranks: &BTreeMap<String, usize>) -> f64 {
        self.symptoms
            .iter()
            .map(|s| s.weight * ranks.get(&s.key).copied().unwrap_or(0) as f64)
            .sum()
    }

    /// Ranks in question order, followed by the rule percentage as a fraction.
    pub fn feature_vector(&self, ranks: &BTreeMap<String, usize>, rule_percentage: f64) -> Vec<f64> {
        let mut out: Vec<f64> = self
            .symptoms
            .iter()
            .map(|s| ranks.get(&s.key).copied().unwrap_or(0) as f64)
            .collect();
        out.push(rule_percentage / 100.0);
        out
    }

    pub fn feature_count(&self) -> usize {
        self.symptoms.len() + 1
    }
}

// ---- Canonical profiles ----

const PITCH: [&str; 5] = ["Very high", "High", "Normal", "Low", "Very low"];
const DURATION: [&str; 5] = [
    "No changes",
    "Less than 6 months",
    "6-12 months",
    "1-2 years",
    "Over 2 years",
];
const SEVERITY: [&str; 5] = ["Not at all", "Mild", "Moderate", "Severe", "Very severe"];

fn frequency_symptoms(items: &[(&str, &str, f64)]) -> Vec<Symptom> {
    let scale = SeverityScale::frequency();
    items
        .iter()
        .map(|(k, q, w)| Symptom::new(*k, *q, *w, scale.clone()))
        .collect()
}

fn bands_with_high_guidance(high: &str) -> BandTable {
    let mut bands: Vec<RiskBand> = BandTable::standard().into();
    if let Some(top) = bands.last_mut() {
        top.guidance = high.to_string();
    }
    BandTable::new(bands).unwrap_or_else(|_| BandTable::standard())
}

fn overrides_or_empty(rules: Vec<OverrideRule>) -> OverrideSet {
    OverrideSet::new(rules).unwrap_or_default()
}

pub fn diabetes() -> AssessmentProfile {
    AssessmentProfile {
        condition: Condition::Diabetes,
        title: "Diabetes Risk Check".into(),
        symptoms: frequency_symptoms(&[
            ("thirst", "Do you feel unusually thirsty?", 8.0),
            ("hunger", "Do you feel hungry even after meals?", 7.0),
            ("vision", "Is your vision blurry?", 9.0),
            ("wounds", "Do cuts or wounds take longer to heal?", 10.0),
            ("fatigue", "Do you feel tired often?", 5.0),
            ("tingling", "Do you feel tingling in your hands or feet?", 6.0),
        ]),
        bands: bands_with_high_guidance(
            "Several diabetes indicators detected. Please get a blood glucose test.",
        ),
        overrides: overrides_or_empty(vec![
            OverrideRule::new("Emergency", 40.0, 3.0, 70.0).guidance(
                "Multiple diabetic emergency symptoms detected. Get an emergency blood glucose test, \
                 an urgent HbA1c and ketones test, and an endocrine consult.",
            ),
            OverrideRule::new("Urgent", 30.0, 2.0, 50.0).guidance(
                "Same-day glucose testing, HbA1c within 24 hours and an ophthalmology referral are recommended.",
            ),
        ]),
        escalations: Vec::new(),
    }
}

pub fn heart() -> AssessmentProfile {
    AssessmentProfile {
        condition: Condition::Heart,
        title: "Heart Risk Check".into(),
        symptoms: frequency_symptoms(&[
            ("chest_pain", "Do you feel chest tightness or pain?", 10.0),
            ("tiredness", "Do you feel tired doing small activities?", 8.0),
            ("breathlessness", "Do you feel breathless often?", 9.0),
            ("sweating", "Do you sweat more than usual while resting?", 7.0),
            ("dizziness", "Do you feel dizzy or faint?", 6.0),
            ("palpitations", "Is your heartbeat irregular or very fast?", 8.0),
        ]),
        bands: bands_with_high_guidance(
            "Several heart disease indicators detected. Please see a cardiologist.",
        ),
        overrides: overrides_or_empty(vec![
            OverrideRule::new("Critical", 50.0, 2.5, 0.0).ceiling(95.0).guidance(
                "Multiple high-risk symptoms detected. Call emergency services and remain seated while waiting for help.",
            ),
            OverrideRule::new("Urgent", 30.0, 1.8, 0.0).ceiling(80.0).guidance(
                "Same-day cardiology consult, ECG and troponin tests, and blood pressure monitoring are recommended.",
            ),
        ]),
        escalations: Vec::new(),
    }
}

pub fn parkinsons() -> AssessmentProfile {
    let freq = SeverityScale::frequency();
    AssessmentProfile {
        condition: Condition::Parkinsons,
        title: "Parkinson's Voice Screening".into(),
        symptoms: vec![
            Symptom::new("pitch", "Speaking pitch", 4.0, SeverityScale::from_static(&PITCH)),
            Symptom::new("voice_shaking", "Voice shaking", 8.0, freq.clone()),
            Symptom::new("volume_fluctuation", "Volume fluctuation", 6.0, freq.clone()),
            Symptom::new("voice_roughness", "Voice roughness", 6.0, freq.clone()),
            Symptom::new("speech_difficulty", "Speech understanding difficulty", 10.0, freq),
            Symptom::new(
                "duration",
                "Duration of symptoms",
                4.0,
                SeverityScale::from_static(&DURATION),
            ),
            Symptom::new(
                "severity",
                "Severity of symptoms",
                12.0,
                SeverityScale::from_static(&SEVERITY),
            ),
        ],
        bands: bands_with_high_guidance(
            "Several strong indicators detected. Please consult a neurologist.",
        ),
        overrides: overrides_or_empty(vec![
            OverrideRule::new("Emergency", 75.0, 2.5, 85.0).ceiling(99.0).guidance(
                "Urgent movement disorder specialist referral today and DaTscan imaging are advised.",
            ),
            OverrideRule::new("Advanced", 55.0, 2.0, 75.0).ceiling(90.0).guidance(
                "Neurology consult within 24-48 hours and a complete UPDRS assessment are recommended.",
            ),
        ]),
        escalations: vec![EscalationRule {
            name: "severe_with_unclear_speech".into(),
            all_of: vec![
                RankAtLeast { symptom: "severity".into(), min_rank: 3 },
                RankAtLeast { symptom: "speech_difficulty".into(), min_rank: 3 },
            ],
            multiplier: 1.2,
        }],
    }
}

/// The three built-in profiles, keyed by condition.
pub fn builtin() -> BTreeMap<Condition, AssessmentProfile> {
    [diabetes(), heart(), parkinsons()]
        .into_iter()
        .map(|p| (p.condition, p))
        .collect()
}
