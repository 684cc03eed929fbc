//! Process stages and the circular sequence they form.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Physical role a stage plays in the water generator.
///
/// Visual behavior is keyed on the role rather than the stage key, so a
/// sequence may use any keys it likes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageRole {
    AirIntake,
    Condensation,
    Filtration,
    UvTreatment,
    Dispense,
    Mineralization,
}

impl StageRole {
    pub const ALL: [StageRole; 6] = [
        StageRole::AirIntake,
        StageRole::Condensation,
        StageRole::Filtration,
        StageRole::UvTreatment,
        StageRole::Dispense,
        StageRole::Mineralization,
    ];

    /// Canonical key, matching the serialized name.
    pub fn key(self) -> &'static str {
        match self {
            StageRole::AirIntake => "air-intake",
            StageRole::Condensation => "condensation",
            StageRole::Filtration => "filtration",
            StageRole::UvTreatment => "uv-treatment",
            StageRole::Dispense => "dispense",
            StageRole::Mineralization => "mineralization",
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            StageRole::AirIntake => "Air Intake",
            StageRole::Condensation => "Condensation",
            StageRole::Filtration => "Filtration",
            StageRole::UvTreatment => "UV Treatment",
            StageRole::Dispense => "Dispense",
            StageRole::Mineralization => "Mineralization",
        }
    }
}

/// Serializable stage definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub key: String,
    pub label: String,
    pub role: StageRole,
}

impl StageDef {
    pub fn new(key: &str, label: &str, role: StageRole) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            role,
        }
    }

    /// Definition using the role's canonical key and label.
    pub fn from_role(role: StageRole) -> Self {
        Self::new(role.key(), role.default_label(), role)
    }
}

/// A stage placed in a sequence. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    key: String,
    label: String,
    role: StageRole,
    ordinal: usize,
}

impl Stage {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> StageRole {
        self.role
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Ordered, circular list of stages.
#[derive(Clone, Debug)]
pub struct StageSequence {
    stages: Vec<Stage>,
}

impl StageSequence {
    /// Build a sequence. Fails on an empty list or duplicate keys.
    pub fn new(defs: &[StageDef]) -> Result<Self, ConfigError> {
        if defs.is_empty() {
            return Err(ConfigError::Invalid("stage sequence is empty".into()));
        }

        let mut stages: Vec<Stage> = Vec::with_capacity(defs.len());
        for (ordinal, def) in defs.iter().enumerate() {
            if stages.iter().any(|s| s.key == def.key) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate stage key `{}`",
                    def.key
                )));
            }
            stages.push(Stage {
                key: def.key.clone(),
                label: def.label.clone(),
                role: def.role,
                ordinal,
            });
        }

        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Never true: construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Stage> {
        self.stages.get(ordinal)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }
}

impl Index<usize> for StageSequence {
    type Output = Stage;

    fn index(&self, ordinal: usize) -> &Stage {
        &self.stages[ordinal]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> StageSequence {
        let defs: Vec<StageDef> = StageRole::ALL.iter().map(|&r| StageDef::from_role(r)).collect();
        StageSequence::new(&defs).unwrap()
    }

    #[test]
    fn test_standard_sequence_order() {
        let seq = standard();
        assert_eq!(seq.len(), 6);
        assert_eq!(seq.get(0).unwrap().key(), "air-intake");
        assert_eq!(seq.get(5).unwrap().role(), StageRole::Mineralization);
        for (i, stage) in seq.iter().enumerate() {
            assert_eq!(stage.ordinal(), i);
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let defs = vec![
            StageDef::new("air", "Air", StageRole::AirIntake),
            StageDef::new("air", "Again", StageRole::Condensation),
        ];
        assert!(matches!(StageSequence::new(&defs), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(StageSequence::new(&[]).is_err());
    }

    #[test]
    fn test_index_of() {
        let seq = standard();
        assert_eq!(seq.index_of("dispense"), Some(4));
        assert_eq!(seq.index_of("nope"), None);
    }

    #[test]
    fn test_role_serde_kebab() {
        let json = serde_json::to_string(&StageRole::UvTreatment).unwrap();
        assert_eq!(json, "\"uv-treatment\"");
    }
}
