// src/config.rs
//! Startup configuration: assessment profiles and per-condition models.
//!
//! Sources, in order:
//! 1) `.env` (via dotenvy, loaded by the binary)
//! 2) `$ASSESSMENT_CONFIG_PATH` or `config/assessments.toml`: replaces built-in
//!    profiles per condition; a missing default file keeps the built-ins
//! 3) `$MODEL_CONFIG_PATH` or `config/models.toml`: optional models
//! 4) `MODEL_TEST_MODE=fixed:<p>` attaches a constant model to every condition
//!
//! Both files may be TOML or JSON (picked by extension, TOML otherwise).

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::assessment::Assessor;
use crate::error::ConfigError;
use crate::model::{DisabledModel, DynModel, FixedModel, LogisticModel};
use crate::profile::{self, AssessmentProfile, Condition};

pub const ENV_ASSESSMENT_CONFIG_PATH: &str = "ASSESSMENT_CONFIG_PATH";
pub const DEFAULT_ASSESSMENT_CONFIG_PATH: &str = "config/assessments.toml";
pub const ENV_MODEL_CONFIG_PATH: &str = "MODEL_CONFIG_PATH";
pub const DEFAULT_MODEL_CONFIG_PATH: &str = "config/models.toml";
pub const ENV_MODEL_TEST_MODE: &str = "MODEL_TEST_MODE";

#[derive(Debug, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: Vec<AssessmentProfile>,
}

/// One entry of the models file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic(LogisticModel),
    Fixed { probability: f64 },
    Disabled,
}

impl ModelSpec {
    fn build(self, profile: &AssessmentProfile) -> Result<DynModel, ConfigError> {
        match self {
            ModelSpec::Logistic(m) => {
                if m.feature_count() != profile.feature_count() {
                    return Err(ConfigError::ModelShape {
                        expected: m.feature_count(),
                        actual: profile.feature_count(),
                    });
                }
                Ok(Arc::new(m))
            }
            ModelSpec::Fixed { probability } => Ok(Arc::new(FixedModel { probability })),
            ModelSpec::Disabled => Ok(Arc::new(DisabledModel)),
        }
    }
}

/// Profiles plus the models bound to them. Immutable once built.
#[derive(Clone)]
pub struct AppConfig {
    pub profiles: BTreeMap<Condition, AssessmentProfile>,
    pub models: BTreeMap<Condition, DynModel>,
}

impl AppConfig {
    /// Built-in canonical profiles, no models.
    pub fn builtin() -> Self {
        Self {
            profiles: profile::builtin(),
            models: BTreeMap::new(),
        }
    }

    /// Resolve paths and test mode from the environment.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::builtin();

        if let Some(path) = resolve_path(ENV_ASSESSMENT_CONFIG_PATH, DEFAULT_ASSESSMENT_CONFIG_PATH)? {
            for p in load_profiles_from(&path)? {
                cfg.profiles.insert(p.condition(), p);
            }
            info!(path = %path.display(), "assessment profiles loaded");
        }

        if let Some(path) = resolve_path(ENV_MODEL_CONFIG_PATH, DEFAULT_MODEL_CONFIG_PATH)? {
            let specs = load_model_specs_from(&path)?;
            cfg.attach_models(specs)?;
            info!(path = %path.display(), models = cfg.models.len(), "model config loaded");
        }

        if let Some(p) = parse_test_mode(std::env::var(ENV_MODEL_TEST_MODE).ok().as_deref())? {
            for c in Condition::ALL {
                cfg.models.insert(c, Arc::new(FixedModel { probability: p }));
            }
            info!(probability = p, "model test mode: fixed probability for all conditions");
        }

        Ok(cfg)
    }

    pub fn attach_models(&mut self, specs: BTreeMap<Condition, ModelSpec>) -> Result<()> {
        for (condition, spec) in specs {
            let profile = self
                .profiles
                .get(&condition)
                .ok_or_else(|| anyhow!("model configured for unprofiled condition '{condition}'"))?;
            let model = spec
                .build(profile)
                .with_context(|| format!("building model for '{condition}'"))?;
            self.models.insert(condition, model);
        }
        Ok(())
    }

    /// One assessor per configured profile.
    pub fn assessors(&self) -> BTreeMap<Condition, Assessor> {
        self.profiles
            .iter()
            .map(|(c, p)| {
                let mut a = Assessor::new(p.clone());
                if let Some(m) = self.models.get(c) {
                    a = a.with_model(Arc::clone(m));
                }
                (*c, a)
            })
            .collect()
    }
}

/// Env var must point at an existing file; the default path is optional.
fn resolve_path(env_key: &str, default: &str) -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        bail!("{env_key} points to non-existent path {}", pb.display());
    }
    let pb = PathBuf::from(default);
    Ok(pb.exists().then_some(pb))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load and validate profiles from a TOML/JSON file with a `profiles` list.
pub fn load_profiles_from(path: &Path) -> Result<Vec<AssessmentProfile>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading assessment profiles from {}", path.display()))?;
    let file: ProfilesFile = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    Ok(file.profiles)
}

/// Load model specs keyed by condition name.
pub fn load_model_specs_from(path: &Path) -> Result<BTreeMap<Condition, ModelSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading model config from {}", path.display()))?;
    let raw: BTreeMap<String, ModelSpec> = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    raw.into_iter()
        .map(|(k, v)| {
            let c = k.parse::<Condition>().map_err(|e| anyhow!(e))?;
            Ok((c, v))
        })
        .collect()
}

/// `fixed:<p>` with `p` in [0, 1]; anything else except empty/`off` is an error.
fn parse_test_mode(raw: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    let p = raw
        .strip_prefix("fixed:")
        .ok_or_else(|| anyhow!("unsupported {ENV_MODEL_TEST_MODE} '{raw}'"))?
        .trim()
        .parse::<f64>()
        .with_context(|| format!("parsing {ENV_MODEL_TEST_MODE} probability"))?;
    if !(0.0..=1.0).contains(&p) {
        bail!("{ENV_MODEL_TEST_MODE} probability {p} outside [0, 1]");
    }
    Ok(Some(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const HEART_TOML: &str = r#"
[[profiles]]
condition = "heart"
title = "Short heart check"

[[profiles.symptoms]]
key = "chest_pain"
question = "Chest pain?"
weight = 10
scale = ["No", "Yes"]

[[profiles.symptoms]]
key = "breathlessness"
question = "Breathless?"
weight = 5
scale = ["No", "Sometimes", "Yes"]

[[profiles.overrides]]
label = "Critical"
threshold = 60
multiplier = 2.0
ceiling = 95
"#;

    #[test]
    fn parses_toml_profiles_with_defaults() {
        let file: ProfilesFile = toml::from_str(HEART_TOML).unwrap();
        let p = &file.profiles[0];
        assert_eq!(p.condition(), Condition::Heart);
        assert_eq!(p.max_score(), 20.0);
        assert_eq!(p.bands().bands().len(), 4);
        assert_eq!(p.overrides().rules()[0].floor, 0.0);
        assert_eq!(p.overrides().rules()[0].ceiling, 95.0);
    }

    #[test]
    fn invalid_profile_is_a_parse_error() {
        let bad = HEART_TOML.replace("weight = 5", "weight = -5");
        assert!(toml::from_str::<ProfilesFile>(&bad).is_err());
    }

    #[test]
    fn logistic_shape_must_match_profile() {
        let mut cfg = AppConfig::builtin();
        let specs = BTreeMap::from([(
            Condition::Diabetes,
            ModelSpec::Logistic(LogisticModel::new(0.0, vec![0.1; 3])),
        )]);
        let err = cfg.attach_models(specs).unwrap_err();
        assert!(format!("{err:#}").contains("coefficients"));

        let specs = BTreeMap::from([(
            Condition::Diabetes,
            ModelSpec::Logistic(LogisticModel::new(-2.0, vec![0.1; 7])),
        )]);
        cfg.attach_models(specs).unwrap();
        assert!(cfg.models.contains_key(&Condition::Diabetes));
    }

    #[test]
    fn model_specs_parse_by_kind() {
        let toml = r#"
[diabetes]
kind = "logistic"
intercept = -1.5
coefficients = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 1.0]

[heart]
kind = "fixed"
probability = 0.3

[parkinsons]
kind = "disabled"
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.toml");
        fs::write(&path, toml).unwrap();
        let specs = load_model_specs_from(&path).unwrap();
        assert_eq!(specs.len(), 3);
        assert!(matches!(specs[&Condition::Heart], ModelSpec::Fixed { probability } if probability == 0.3));
        assert!(matches!(specs[&Condition::Parkinsons], ModelSpec::Disabled));
    }

    #[test]
    fn loads_json_profiles_by_extension() {
        let json = r#"{
            "profiles": [{
                "condition": "diabetes",
                "title": "Quick diabetes check",
                "symptoms": [
                    {"key": "thirst", "question": "Thirsty?", "weight": 8, "scale": ["No", "Yes"]},
                    {"key": "vision", "question": "Blurry vision?", "weight": 9, "scale": ["No", "Yes"]}
                ],
                "overrides": [{"label": "Urgent", "threshold": 50, "multiplier": 2.0, "floor": 50}]
            }]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assessments.JSON");
        fs::write(&path, json).unwrap();

        let profiles = load_profiles_from(&path).unwrap();
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.condition(), Condition::Diabetes);
        assert_eq!(p.max_score(), 17.0);
        assert_eq!(p.overrides().rules()[0].floor, 50.0);

        // Same content under a .toml name goes through the TOML parser and fails.
        let toml_path = dir.path().join("assessments.toml");
        fs::write(&toml_path, json).unwrap();
        assert!(load_profiles_from(&toml_path).is_err());
    }

    #[test]
    fn shipped_example_configs_are_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let profiles = load_profiles_from(&dir.join("assessments.example.toml")).unwrap();
        assert_eq!(profiles[0].condition(), Condition::Heart);

        let mut cfg = AppConfig::builtin();
        for p in profiles {
            cfg.profiles.insert(p.condition(), p);
        }
        let mut specs = load_model_specs_from(&dir.join("models.example.toml")).unwrap();
        // The example heart profile has three questions; drop specs that assume the built-in one.
        specs.retain(|c, _| *c != Condition::Heart);
        cfg.attach_models(specs).unwrap();
        assert_eq!(cfg.models.len(), 2);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(parse_test_mode(None).unwrap(), None);
        assert_eq!(parse_test_mode(Some("off")).unwrap(), None);
        assert_eq!(parse_test_mode(Some("fixed:0.25")).unwrap(), Some(0.25));
        assert!(parse_test_mode(Some("fixed:1.5")).is_err());
        assert!(parse_test_mode(Some("mock")).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn from_env_uses_env_paths_then_builtins() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_ASSESSMENT_CONFIG_PATH);
        env::remove_var(ENV_MODEL_CONFIG_PATH);
        env::remove_var(ENV_MODEL_TEST_MODE);

        // No files in the temp cwd: built-ins only.
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.profiles.len(), 3);
        assert!(cfg.models.is_empty());

        // Env path replaces the heart profile only.
        let p = tmp.path().join("custom.toml");
        fs::write(&p, HEART_TOML).unwrap();
        env::set_var(ENV_ASSESSMENT_CONFIG_PATH, p.display().to_string());
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.profiles[&Condition::Heart].title(), "Short heart check");
        assert_eq!(cfg.profiles[&Condition::Diabetes].max_score(), 180.0);

        // Dangling env path is an error.
        env::set_var(ENV_ASSESSMENT_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(AppConfig::from_env().is_err());
        env::remove_var(ENV_ASSESSMENT_CONFIG_PATH);

        env::set_var(ENV_MODEL_TEST_MODE, "fixed:0.5");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.models.len(), 3);
        env::remove_var(ENV_MODEL_TEST_MODE);

        env::set_current_dir(&old).unwrap();
    }
}
