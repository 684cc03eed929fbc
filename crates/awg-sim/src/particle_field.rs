//! Bounded particle swarms streaming through a box.
//!
//! Each particle moves along the field direction, picks up a helical wobble
//! from its own phase, and wraps toroidally per axis inside
//! `[-half_extents, +half_extents]`.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stage::StageRole;
use crate::visual_map::SpeedLaw;

/// Lateral displacement per tick at unit swirl.
pub const SWIRL_STEP: f32 = 0.02;

/// Substituted for a zero or non-finite direction.
pub const DEFAULT_DIRECTION: Vec3 = Vec3::Y;

/// Substituted for a non-positive or non-finite half-extent component.
pub const DEFAULT_HALF_EXTENT: f32 = 0.5;

/// Larger half-extent components are clamped to this.
pub const MAX_HALF_EXTENT: f32 = 1.0e4;

/// Swirl amplitudes are clamped into `[0, MAX_SWIRL]`.
pub const MAX_SWIRL: f32 = 100.0;

/// Upper bound on `FieldConfig::count`, enforced by config validation.
pub const MAX_FIELD_PARTICLES: usize = 1_000_000;

/// Static configuration of one field. Geometry is fixed after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Key of the owning stage.
    pub stage: String,
    pub count: usize,
    #[serde(with = "crate::serde_utils::vec3")]
    pub half_extents: Vec3,
    #[serde(with = "crate::serde_utils::vec3")]
    pub direction: Vec3,
    pub speed: SpeedLaw,
    #[serde(default)]
    pub swirl: f32,

    // Render-only, passed through untouched.
    #[serde(default = "default_point_size")]
    pub point_size: f32,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_point_size() -> f32 {
    0.03
}
fn default_color() -> [f32; 3] {
    [0.55, 0.8, 1.0]
}
fn default_opacity() -> f32 {
    0.8
}

impl FieldConfig {
    /// Stock field for a stage role.
    pub fn for_role(role: StageRole, stage_key: &str) -> Self {
        let base = Self {
            stage: stage_key.to_string(),
            count: 160,
            half_extents: Vec3::new(0.6, 0.6, 0.6),
            direction: Vec3::NEG_Y,
            speed: SpeedLaw::flow(0.15, 1.0),
            swirl: 0.0,
            point_size: default_point_size(),
            color: default_color(),
            opacity: default_opacity(),
        };

        match role {
            StageRole::AirIntake => Self {
                count: 220,
                half_extents: Vec3::new(1.2, 0.6, 0.6),
                direction: Vec3::X,
                speed: SpeedLaw::flow(0.2, 0.75),
                swirl: 0.6,
                color: [0.85, 0.9, 1.0],
                opacity: 0.45,
                ..base
            },
            StageRole::Condensation => Self {
                count: 180,
                half_extents: Vec3::new(0.5, 0.8, 0.5),
                speed: SpeedLaw::condensation(0.08, 0.5),
                swirl: 0.3,
                point_size: 0.04,
                color: [0.6, 0.85, 1.0],
                ..base
            },
            StageRole::Filtration => Self {
                half_extents: Vec3::new(0.4, 0.9, 0.4),
                swirl: 0.1,
                color: [0.7, 0.75, 0.6],
                ..base
            },
            StageRole::UvTreatment => Self {
                half_extents: Vec3::new(1.0, 0.3, 0.3),
                direction: Vec3::X,
                swirl: 0.25,
                color: [0.7, 0.6, 1.0],
                ..base
            },
            StageRole::Dispense => Self {
                count: 120,
                half_extents: Vec3::new(0.15, 0.7, 0.15),
                point_size: 0.035,
                ..base
            },
            StageRole::Mineralization => Self {
                half_extents: Vec3::new(0.5, 0.5, 0.5),
                direction: Vec3::new(1.0, -1.0, 0.0),
                swirl: 0.4,
                color: [0.6, 0.95, 0.85],
                ..base
            },
        }
    }

    /// Replace degenerate geometry with defaults.
    fn normalized(mut self) -> Self {
        self.direction = match self.direction.try_normalize() {
            Some(d) => d,
            None => {
                log::warn!(
                    "field `{}`: direction {:?} is degenerate, using {:?}",
                    self.stage,
                    self.direction,
                    DEFAULT_DIRECTION
                );
                DEFAULT_DIRECTION
            }
        };

        for axis in 0..3 {
            let h = self.half_extents[axis];
            if !(h.is_finite() && h > 0.0) {
                log::warn!(
                    "field `{}`: half extent {} on axis {} is invalid, using {}",
                    self.stage,
                    h,
                    axis,
                    DEFAULT_HALF_EXTENT
                );
                self.half_extents[axis] = DEFAULT_HALF_EXTENT;
            } else if h > MAX_HALF_EXTENT {
                log::warn!(
                    "field `{}`: half extent {} on axis {} is too large, clamping to {}",
                    self.stage,
                    h,
                    axis,
                    MAX_HALF_EXTENT
                );
                self.half_extents[axis] = MAX_HALF_EXTENT;
            }
        }

        let speed = self.speed.normalized();
        if speed != self.speed {
            log::warn!(
                "field `{}`: speed law {:?} adjusted to {:?}",
                self.stage,
                self.speed,
                speed
            );
        }
        self.speed = speed;

        self.swirl = if self.swirl.is_finite() {
            self.swirl.clamp(0.0, MAX_SWIRL)
        } else {
            0.0
        };
        self
    }
}

/// One stage's particle swarm.
#[derive(Clone, Debug)]
pub struct ParticleField {
    config: FieldConfig,
    positions: Vec<Vec3>,
    /// Fixed per-particle phase in [0, 2π).
    phases: Vec<f32>,
    /// The two axes perpendicular-ish to the flow that carry the swirl.
    lateral_axes: (usize, usize),
}

impl ParticleField {
    /// Scatter particles uniformly in the box with uniform random phases.
    pub fn new<R: Rng + ?Sized>(config: FieldConfig, rng: &mut R) -> Self {
        let config = config.normalized();
        let half = config.half_extents;

        let mut positions = Vec::with_capacity(config.count);
        let mut phases = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            positions.push(Vec3::new(
                rng.gen_range(-half.x..=half.x),
                rng.gen_range(-half.y..=half.y),
                rng.gen_range(-half.z..=half.z),
            ));
            phases.push(rng.gen_range(0.0..TAU));
        }

        let lateral_axes = lateral_axes(config.direction);

        Self {
            config,
            positions,
            phases,
            lateral_axes,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn stage_key(&self) -> &str {
        &self.config.stage
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Advance every particle by `dt` seconds at `speed`.
    ///
    /// Only call this while the field is active; inactive fields are left
    /// untouched so they resume from where they stopped.
    pub fn advance(&mut self, speed: f32, elapsed: f32, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let speed = if speed.is_finite() { speed } else { 0.0 };

        let step = self.config.direction * speed * dt;
        let swirl = self.config.swirl;
        let omega = 0.8 + swirl * 1.2;
        let wobble = swirl * SWIRL_STEP;
        let (a, b) = self.lateral_axes;
        let half = self.config.half_extents;

        for (p, &phase) in self.positions.iter_mut().zip(&self.phases) {
            *p += step;

            if swirl > 0.0 {
                let angle = phase + elapsed * omega;
                p[a] += angle.sin() * wobble;
                p[b] += angle.cos() * wobble;
            }

            wrap(p, half);
        }
    }
}

/// Re-enter at the opposite face, independently per axis.
fn wrap(p: &mut Vec3, half: Vec3) {
    for axis in 0..3 {
        let h = half[axis];
        if p[axis] > h {
            p[axis] = -h;
        } else if p[axis] < -h {
            p[axis] = h;
        }
    }
}

/// The two axes other than the direction's dominant one.
fn lateral_axes(direction: Vec3) -> (usize, usize) {
    let d = direction.abs();
    let main = if d.x >= d.y && d.x >= d.z {
        0
    } else if d.y >= d.z {
        1
    } else {
        2
    };
    ((main + 1) % 3, (main + 2) % 3)
}
