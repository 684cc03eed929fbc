//! Declarative stage -> target lookup.
//!
//! All per-stage branching lives here. Every output has an idle value and an
//! active value that rises with its associated input; only the numbers are
//! tunable.

use serde::{Deserialize, Serialize};

use crate::inputs::{ControlInputs, InputAxis};
use crate::stage::StageRole;
use crate::visual_state::{SlotPolicy, SlotValues, VisualSlot};

/// Lowest idle fan scale. The fan never reads as fully stopped.
pub const MIN_FAN_IDLE_SCALE: f32 = 0.05;

/// Intake fan angular rate: `(base + flow * gain) * scale`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FanTuning {
    pub base: f32,
    pub flow_gain: f32,
    pub active_scale: f32,
    pub idle_scale: f32,
}

impl Default for FanTuning {
    fn default() -> Self {
        Self {
            base: 1.2,
            flow_gain: 10.0,
            active_scale: 1.0,
            idle_scale: 0.2,
        }
    }
}

/// Emissive intensity: `base + input * gain` when active, `idle` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlowTuning {
    pub base: f32,
    pub gain: f32,
    pub idle: f32,
}

/// Tank fill fraction, smoothed toward `high` or `low`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelTuning {
    pub high: f32,
    pub low: f32,
    /// Fraction of the gap left after one second.
    pub rate: f32,
}

/// Every tunable constant of the visual map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualTuning {
    pub fan: FanTuning,
    pub condenser_glow: GlowTuning,
    pub uv_glow: GlowTuning,
    pub prefilter_level: LevelTuning,
    pub clean_level: LevelTuning,
}

impl Default for VisualTuning {
    fn default() -> Self {
        Self {
            fan: FanTuning::default(),
            condenser_glow: GlowTuning {
                base: 0.25,
                gain: 0.9,
                idle: 0.08,
            },
            uv_glow: GlowTuning {
                base: 0.65,
                gain: 0.85,
                idle: 0.12,
            },
            prefilter_level: LevelTuning {
                high: 0.8,
                low: 0.35,
                rate: 0.2,
            },
            clean_level: LevelTuning {
                high: 0.85,
                low: 0.3,
                rate: 0.2,
            },
        }
    }
}

impl VisualTuning {
    /// Replace non-finite constants with defaults, force gains non-negative
    /// and keep the idle fan scale above zero.
    pub fn normalized(self) -> Self {
        let d = Self::default();
        let fan = FanTuning {
            base: finite_or(self.fan.base, d.fan.base),
            flow_gain: finite_or(self.fan.flow_gain, d.fan.flow_gain).max(0.0),
            active_scale: finite_or(self.fan.active_scale, d.fan.active_scale).max(0.0),
            idle_scale: finite_or(self.fan.idle_scale, d.fan.idle_scale).max(MIN_FAN_IDLE_SCALE),
        };

        Self {
            fan,
            condenser_glow: self.condenser_glow.normalized(&d.condenser_glow),
            uv_glow: self.uv_glow.normalized(&d.uv_glow),
            prefilter_level: self.prefilter_level.normalized(&d.prefilter_level),
            clean_level: self.clean_level.normalized(&d.clean_level),
        }
    }
}

impl GlowTuning {
    fn normalized(self, fallback: &GlowTuning) -> Self {
        Self {
            base: finite_or(self.base, fallback.base),
            gain: finite_or(self.gain, fallback.gain).max(0.0),
            idle: finite_or(self.idle, fallback.idle),
        }
    }
}

impl LevelTuning {
    fn normalized(self, fallback: &LevelTuning) -> Self {
        Self {
            high: finite_or(self.high, fallback.high),
            low: finite_or(self.low, fallback.low),
            rate: finite_or(self.rate, fallback.rate),
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        log::warn!("tuning value {} is not finite, using {}", value, fallback);
        fallback
    }
}

/// Affine speed law for a particle field: `base + gain * input`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedLaw {
    pub base: f32,
    pub gain: f32,
    pub input: InputAxis,
}

impl SpeedLaw {
    pub fn flow(base: f32, gain: f32) -> Self {
        Self {
            base,
            gain,
            input: InputAxis::Flow,
        }
    }

    pub fn condensation(base: f32, gain: f32) -> Self {
        Self {
            base,
            gain,
            input: InputAxis::Condensation,
        }
    }

    /// Non-finite terms become zero and a negative gain is raised to zero,
    /// so speed never falls as the input rises.
    pub fn normalized(self) -> Self {
        Self {
            base: if self.base.is_finite() { self.base } else { 0.0 },
            gain: if self.gain.is_finite() { self.gain.max(0.0) } else { 0.0 },
            input: self.input,
        }
    }

    pub fn eval(&self, inputs: &ControlInputs) -> f32 {
        self.base + self.gain * inputs.get(self.input)
    }
}

/// Activity and speed of one field for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldTarget {
    pub active: bool,
    pub speed: f32,
}

/// Pure mapping from (stage, inputs) to slot targets.
#[derive(Clone, Debug, Default)]
pub struct StageVisualMap {
    tuning: VisualTuning,
}

impl StageVisualMap {
    pub fn new(tuning: VisualTuning) -> Self {
        Self {
            tuning: tuning.normalized(),
        }
    }

    pub fn tuning(&self) -> &VisualTuning {
        &self.tuning
    }

    /// Rotation and glow snap; tank levels are smoothed.
    pub fn policy(&self, slot: VisualSlot) -> SlotPolicy {
        match slot {
            VisualSlot::FanRotation | VisualSlot::CondenserGlow | VisualSlot::UvGlow => {
                SlotPolicy::Instantaneous
            }
            VisualSlot::PrefilterLevel => SlotPolicy::Smoothed {
                rate: self.tuning.prefilter_level.rate,
            },
            VisualSlot::CleanLevel => SlotPolicy::Smoothed {
                rate: self.tuning.clean_level.rate,
            },
        }
    }

    /// Targets for every slot.
    pub fn evaluate(&self, role: StageRole, inputs: &ControlInputs) -> SlotValues {
        let mut out = [0.0; VisualSlot::COUNT];
        for slot in VisualSlot::ALL {
            out[slot.index()] = self.target(slot, role, inputs);
        }
        out
    }

    /// Target for one slot. Overflowing tuning products read as zero.
    pub fn target(&self, slot: VisualSlot, role: StageRole, inputs: &ControlInputs) -> f32 {
        let t = &self.tuning;
        let value = match slot {
            VisualSlot::FanRotation => {
                let rate = t.fan.base + inputs.flow() * t.fan.flow_gain;
                let scale = if role == StageRole::AirIntake {
                    t.fan.active_scale
                } else {
                    t.fan.idle_scale
                };
                rate * scale
            }
            VisualSlot::CondenserGlow => glow(
                &t.condenser_glow,
                role == StageRole::Condensation,
                inputs.condensation(),
            ),
            VisualSlot::UvGlow => glow(&t.uv_glow, role == StageRole::UvTreatment, inputs.flow()),
            VisualSlot::PrefilterLevel => match role {
                StageRole::Filtration | StageRole::Condensation => t.prefilter_level.low,
                _ => t.prefilter_level.high,
            },
            VisualSlot::CleanLevel => match role {
                StageRole::UvTreatment | StageRole::Dispense | StageRole::Mineralization => {
                    t.clean_level.high
                }
                _ => t.clean_level.low,
            },
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// A field is active only while its owning stage is current.
    pub fn field_target(
        &self,
        owning_stage: usize,
        current_stage: usize,
        law: &SpeedLaw,
        inputs: &ControlInputs,
    ) -> FieldTarget {
        FieldTarget {
            active: owning_stage == current_stage,
            speed: law.eval(inputs),
        }
    }
}

fn glow(tuning: &GlowTuning, active: bool, input: f32) -> f32 {
    if active {
        tuning.base + input * tuning.gain
    } else {
        tuning.idle
    }
}
