use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::inputs::ControlInputs;
use crate::particle_field::{FieldConfig, MAX_FIELD_PARTICLES};
use crate::stage::{StageDef, StageRole};
use crate::visual_map::VisualTuning;

/// Auto-advance timer settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoAdvanceConfig {
    pub enabled: bool,
    pub period_ms: u64,
}

impl AutoAdvanceConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: 2800,
        }
    }
}

/// Full simulation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    pub stages: Vec<StageDef>,
    /// Exactly one per stage, matched by stage key.
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub tuning: VisualTuning,
    #[serde(default)]
    pub auto_advance: AutoAdvanceConfig,
    #[serde(default)]
    pub start_stage: usize,
    #[serde(default)]
    pub inputs: ControlInputs,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    0x5EED_A1E5
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::walkthrough()
    }
}

impl SimConfig {
    /// Build a config for the given stages with stock fields and tuning.
    pub fn from_stages(name: &str, stages: Vec<StageDef>) -> Self {
        let fields = stages
            .iter()
            .map(|s| FieldConfig::for_role(s.role, &s.key))
            .collect();

        Self {
            name: name.to_string(),
            stages,
            fields,
            tuning: VisualTuning::default(),
            auto_advance: AutoAdvanceConfig::default(),
            start_stage: 0,
            inputs: ControlInputs::default(),
            seed: default_seed(),
        }
    }

    /// Guided tour: auto-advance every 2.8 s from the first stage.
    pub fn walkthrough() -> Self {
        let stages = StageRole::ALL.iter().map(|&r| StageDef::from_role(r)).collect();
        Self::from_stages("walkthrough", stages)
    }

    /// Manual exploration: auto-advance off, 3.2 s period once enabled.
    pub fn showcase() -> Self {
        let mut config = Self::walkthrough();
        config.name = "showcase".to_string();
        config.auto_advance = AutoAdvanceConfig {
            enabled: false,
            period_ms: 3200,
        };
        config
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "walkthrough" => Some(Self::walkthrough()),
            "showcase" => Some(Self::showcase()),
            _ => None,
        }
    }

    /// Structural checks. Numeric oddities are normalized later, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::Invalid("no stages".into()));
        }
        if self.start_stage >= self.stages.len() {
            return Err(ConfigError::Invalid(format!(
                "start_stage {} out of range ({} stages)",
                self.start_stage,
                self.stages.len()
            )));
        }

        for field in &self.fields {
            if !self.stages.iter().any(|s| s.key == field.stage) {
                return Err(ConfigError::Invalid(format!(
                    "field references unknown stage `{}`",
                    field.stage
                )));
            }
            if field.count > MAX_FIELD_PARTICLES {
                return Err(ConfigError::Invalid(format!(
                    "field `{}` has {} particles, limit is {}",
                    field.stage, field.count, MAX_FIELD_PARTICLES
                )));
            }
        }

        for stage in &self.stages {
            let n = self.fields.iter().filter(|f| f.stage == stage.key).count();
            if n != 1 {
                return Err(ConfigError::Invalid(format!(
                    "stage `{}` has {} particle fields, expected 1",
                    stage.key, n
                )));
            }
        }

        Ok(())
    }

    /// Write as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a JSON document. Validation happens in [`Simulation::new`](crate::Simulation::new).
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Write as YAML.
    pub fn save_yaml(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Read a YAML document; `.nan` and `.inf` parse and are normalized later.
    pub fn load_yaml(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&yaml)?;
        Ok(config)
    }

    /// Load by extension: `.yaml`/`.yml` as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_yaml(path),
            _ => Self::load_json(path),
        }
    }

    /// Save by extension, mirroring [`SimConfig::load`].
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => self.save_yaml(path),
            _ => self.save_json(path),
        }
    }
}
