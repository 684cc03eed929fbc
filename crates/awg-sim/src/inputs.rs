//! Continuous control inputs owned by the UI.

use serde::{Deserialize, Serialize};

/// Flow and condensation intensity, both in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    flow: f32,
    condensation: f32,
}

impl ControlInputs {
    /// Out-of-range and NaN values are clamped silently.
    pub fn new(flow: f32, condensation: f32) -> Self {
        Self {
            flow: clamp_unit(flow),
            condensation: clamp_unit(condensation),
        }
    }

    pub fn flow(&self) -> f32 {
        self.flow
    }

    pub fn condensation(&self) -> f32 {
        self.condensation
    }

    /// Re-clamp after deserialization, which bypasses `new`.
    pub fn normalized(self) -> Self {
        Self::new(self.flow, self.condensation)
    }

    pub fn get(&self, axis: InputAxis) -> f32 {
        match axis {
            InputAxis::Flow => self.flow,
            InputAxis::Condensation => self.condensation,
        }
    }
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self::new(0.62, 0.58)
    }
}

/// Which input drives a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAxis {
    Flow,
    Condensation,
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
