//! Named output slots and the per-tick state handed to the renderer.

use serde::{Deserialize, Serialize};

/// A named scalar the renderer maps onto a visual property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualSlot {
    /// Intake fan angular rate (rad/s).
    FanRotation,
    /// Condenser coil emissive intensity.
    CondenserGlow,
    /// UV lamp emissive intensity.
    UvGlow,
    /// Pre-filter tank fill fraction.
    PrefilterLevel,
    /// Clean water tank fill fraction.
    CleanLevel,
}

impl VisualSlot {
    pub const COUNT: usize = 5;

    pub const ALL: [VisualSlot; Self::COUNT] = [
        VisualSlot::FanRotation,
        VisualSlot::CondenserGlow,
        VisualSlot::UvGlow,
        VisualSlot::PrefilterLevel,
        VisualSlot::CleanLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualSlot::FanRotation => "fan_rotation",
            VisualSlot::CondenserGlow => "condenser_glow",
            VisualSlot::UvGlow => "uv_glow",
            VisualSlot::PrefilterLevel => "prefilter_level",
            VisualSlot::CleanLevel => "clean_level",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

/// How a slot follows its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Displayed value equals the target every tick.
    Instantaneous,
    /// Displayed value approaches the target; see [`crate::SmoothedChannel`].
    Smoothed { rate: f32 },
}

/// Fixed-size table indexed by [`VisualSlot`].
pub type SlotValues = [f32; VisualSlot::COUNT];

/// Opaque reference to a particle field, resolved through
/// [`crate::Simulation::field_positions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub(crate) usize);

impl FieldHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-field output of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSnapshot {
    pub handle: FieldHandle,
    pub stage_key: String,
    pub active: bool,
    pub speed: f32,
    pub particle_count: usize,
    pub point_size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

/// Everything the renderer reads after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    pub frame: u64,
    pub elapsed: f32,
    pub stage_index: usize,
    pub stage_key: String,
    pub stage_label: String,
    pub values: SlotValues,
    pub targets: SlotValues,
    pub fields: Vec<FieldSnapshot>,
}

impl VisualState {
    pub fn value(&self, slot: VisualSlot) -> f32 {
        self.values[slot.index()]
    }

    pub fn target(&self, slot: VisualSlot) -> f32 {
        self.targets[slot.index()]
    }

    /// Look up a displayed value by slot name.
    pub fn value_by_name(&self, name: &str) -> Option<f32> {
        VisualSlot::from_name(name).map(|s| self.value(s))
    }

    /// `(name, value)` pairs in slot order.
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        VisualSlot::ALL.iter().map(move |&s| (s.name(), self.value(s)))
    }

    pub fn field(&self, stage_key: &str) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|f| f.stage_key == stage_key)
    }

    pub fn active_field(&self) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|f| f.active)
    }
}
