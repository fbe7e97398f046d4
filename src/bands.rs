//! Risk bands: named, contiguous percentage ranges with display guidance.
//!
//! A band covers `[threshold, next_threshold)`; the top band runs to 100.
//! Lookup walks from the highest threshold down and takes the first band whose
//! threshold is <= the percentage, so a value sitting exactly on a boundary
//! lands in the higher band.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub label: String,
    /// Inclusive lower bound in percent.
    pub threshold: f64,
    pub guidance: String,
}

impl RiskBand {
    pub fn new(label: impl Into<String>, threshold: f64, guidance: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            threshold,
            guidance: guidance.into(),
        }
    }
}

/// Validated, ascending band list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RiskBand>", into = "Vec<RiskBand>")]
pub struct BandTable {
    bands: Vec<RiskBand>,
}

impl BandTable {
    /// Bands must start at 0, strictly increase and stay within [0, 100].
    pub fn new(bands: Vec<RiskBand>) -> Result<Self, ConfigError> {
        let first = bands.first().ok_or(ConfigError::NoBands)?;
        if first.threshold != 0.0 {
            return Err(ConfigError::BandsDoNotStartAtZero(first.threshold));
        }
        if let Some(b) = bands.iter().find(|b| !(0.0..=100.0).contains(&b.threshold)) {
            return Err(ConfigError::BandOutOfRange {
                label: b.label.clone(),
                threshold: b.threshold,
            });
        }
        for pair in bands.windows(2) {
            let ordered = pair[1].threshold.is_finite() && pair[1].threshold > pair[0].threshold;
            if !ordered {
                return Err(ConfigError::BandsNotIncreasing(pair[1].label.clone()));
            }
        }
        Ok(Self { bands })
    }

    /// Low / Mild / Moderate / High at 0 / 25 / 50 / 75 with generic guidance.
    pub fn standard() -> Self {
        Self {
            bands: vec![
                RiskBand::new("Low", 0.0, "No major symptoms detected."),
                RiskBand::new("Mild", 25.0, "Minor symptoms detected. Stay observant."),
                RiskBand::new(
                    "Moderate",
                    50.0,
                    "Some signs present. Keep monitoring and consider getting checked.",
                ),
                RiskBand::new(
                    "High",
                    75.0,
                    "Several strong indicators detected. Please consult a doctor.",
                ),
            ],
        }
    }

    pub fn bands(&self) -> &[RiskBand] {
        &self.bands
    }

    /// Total over all inputs: below 0 (or NaN) resolves to the lowest band.
    pub fn classify(&self, percentage: f64) -> &RiskBand {
        self.bands
            .iter()
            .rev()
            .find(|b| percentage >= b.threshold)
            .unwrap_or(&self.bands[0])
    }
}

/// `(label, guidance)` for `percentage`.
pub fn classify(percentage: f64, bands: &BandTable) -> (&str, &str) {
    let band = bands.classify(percentage);
    (band.label.as_str(), band.guidance.as_str())
}

impl TryFrom<Vec<RiskBand>> for BandTable {
    type Error = ConfigError;

    fn try_from(bands: Vec<RiskBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<BandTable> for Vec<RiskBand> {
    fn from(t: BandTable) -> Self {
        t.bands
    }
}
