//! # Severity Scale
//!
//! An ordered list of answer labels, e.g. `Never < Rarely < Sometimes < Often < Always`.
//! A label's rank is its position in the list.
//!
//! - Built once, never mutated; shared by every symptom that uses it.
//! - Lookup is exact and case-sensitive (labels come from a fixed option list).
//! - Serialized as a plain JSON/TOML array of labels.

use crate::error::{ConfigError, ScoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Five-step frequency scale used by most questions.
pub const FREQUENCY_LABELS: [&str; 5] = ["Never", "Rarely", "Sometimes", "Often", "Always"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SeverityScale {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl SeverityScale {
    /// Build a scale from labels ordered from least to most severe.
    pub fn new<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() < 2 {
            return Err(ConfigError::ScaleTooShort(labels.len()));
        }
        let mut index = HashMap::with_capacity(labels.len());
        for (rank, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), rank).is_some() {
                return Err(ConfigError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels, index })
    }

    /// The `Never..Always` frequency scale.
    pub fn frequency() -> Self {
        Self::from_static(&FREQUENCY_LABELS)
    }

    /// Built-in label lists are known to be valid; used for the canonical profiles.
    pub(crate) fn from_static(labels: &[&'static str]) -> Self {
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(rank, l)| (l.clone(), rank))
            .collect();
        Self { labels, index }
    }

    /// Ordinal position of `label`. Unknown labels are a caller contract violation.
    pub fn rank(&self, label: &str) -> Result<usize, ScoreError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| ScoreError::InvalidLabel {
                label: label.to_string(),
                scale: self.labels.join(", "),
            })
    }

    /// Highest rank on this scale (`len - 1`).
    pub fn max_rank(&self) -> usize {
        self.labels.len() - 1
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_at(&self, rank: usize) -> Option<&str> {
        self.labels.get(rank).map(String::as_str)
    }
}

/// Free-function form of [`SeverityScale::rank`].
pub fn rank(label: &str, scale: &SeverityScale) -> Result<usize, ScoreError> {
    scale.rank(label)
}

impl TryFrom<Vec<String>> for SeverityScale {
    type Error = ConfigError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<SeverityScale> for Vec<String> {
    fn from(scale: SeverityScale) -> Self {
        scale.labels
    }
}
