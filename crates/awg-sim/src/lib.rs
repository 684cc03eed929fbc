//! Atmospheric water generator visualization core.
//!
//! Turns the current process stage and two control inputs into smoothly
//! animated numbers every frame: fan rotation, glow intensities, tank levels,
//! and one streaming particle field per stage. Rendering is left to the
//! caller, which reads a [`VisualState`] after each [`Simulation::tick`].
//!
//! # Example
//!
//! ```
//! use awg_sim::{SimConfig, Simulation, StageRequest, VisualSlot};
//!
//! let mut sim = Simulation::new(SimConfig::showcase()).unwrap();
//! sim.set_inputs(0.62, 0.58);
//!
//! let state = sim.tick(0.016, 0.016);
//! assert_eq!(state.stage_key, "air-intake");
//! assert!(state.value(VisualSlot::FanRotation) > 7.0);
//!
//! sim.request_stage(StageRequest::Next).unwrap();
//! let state = sim.tick(0.032, 0.016);
//! assert_eq!(state.stage_key, "condensation");
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod inputs;
pub mod particle_field;
pub mod serde_utils;
pub mod smoothing;
pub mod stage;
pub mod visual_map;
pub mod visual_state;

pub use config::{AutoAdvanceConfig, SimConfig};
pub use controller::{StageController, StageRequest, MIN_AUTO_ADVANCE_PERIOD};
pub use error::{ConfigError, StageError};
pub use glam::Vec3;
pub use inputs::{ControlInputs, InputAxis};
pub use particle_field::{FieldConfig, ParticleField};
pub use smoothing::SmoothedChannel;
pub use stage::{Stage, StageDef, StageRole, StageSequence};
pub use visual_map::{FieldTarget, SpeedLaw, StageVisualMap, VisualTuning};
pub use visual_state::{
    FieldHandle, FieldSnapshot, SlotPolicy, SlotValues, VisualSlot, VisualState,
};

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-frame orchestrator.
///
/// Owns the stage controller, the slot channels, and every particle field.
/// The renderer only reads the [`VisualState`] returned from `tick` and the
/// field positions behind each [`FieldHandle`].
pub struct Simulation {
    sequence: StageSequence,
    controller: StageController,
    map: StageVisualMap,
    inputs: ControlInputs,

    /// `Some` for smoothed slots, `None` for instantaneous ones.
    channels: [Option<SmoothedChannel>; VisualSlot::COUNT],
    /// Indexed by stage ordinal.
    fields: Vec<ParticleField>,
    field_speeds: Vec<f32>,

    frame: u64,
    last_elapsed: f32,
}

impl Simulation {
    /// Build from configuration, seeding particle placement from `config.seed`.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, &mut rng)
    }

    /// Build with a caller-supplied random source.
    pub fn with_rng<R: Rng + ?Sized>(config: SimConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;

        let sequence = StageSequence::new(&config.stages)?;
        let mut controller = StageController::new(sequence.len(), config.start_stage);
        controller.set_auto_advance(config.auto_advance.enabled, config.auto_advance.period());

        let map = StageVisualMap::new(config.tuning);
        let inputs = config.inputs.normalized();

        // validate() guarantees exactly one field per stage.
        let mut fields = Vec::with_capacity(sequence.len());
        for stage in sequence.iter() {
            if let Some(field_config) = config.fields.iter().find(|f| f.stage == stage.key()) {
                fields.push(ParticleField::new(field_config.clone(), rng));
            }
        }

        let start_role = sequence
            .get(controller.current())
            .map(|s| s.role())
            .unwrap_or(StageRole::AirIntake);
        let start_targets = map.evaluate(start_role, &inputs);

        let mut channels = [None; VisualSlot::COUNT];
        for slot in VisualSlot::ALL {
            if let SlotPolicy::Smoothed { rate } = map.policy(slot) {
                channels[slot.index()] = Some(SmoothedChannel::new(start_targets[slot.index()], rate));
            }
        }

        log::info!(
            "simulation `{}`: {} stages, {} particles, starting at `{}`",
            config.name,
            sequence.len(),
            fields.iter().map(|f| f.len()).sum::<usize>(),
            sequence.get(controller.current()).map(|s| s.key()).unwrap_or("?"),
        );

        let field_speeds = vec![0.0; fields.len()];
        Ok(Self {
            sequence,
            controller,
            map,
            inputs,
            channels,
            fields,
            field_speeds,
            frame: 0,
            last_elapsed: 0.0,
        })
    }

    /// Advance one frame.
    ///
    /// `elapsed` is seconds since session start, `dt` the frame delta in
    /// seconds. A non-positive or non-finite `dt` leaves smoothed slots and
    /// particle positions where they are. Never fails.
    pub fn tick(&mut self, elapsed: f32, dt: f32) -> VisualState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let elapsed = if elapsed.is_finite() {
            elapsed
        } else {
            self.last_elapsed
        };
        self.last_elapsed = elapsed;

        let before = self.controller.current();
        let fired = self.controller.poll(elapsed);
        if fired > 0 {
            log::debug!("auto-advance fired {} time(s) at t={:.3}", fired, elapsed);
            self.log_transition(before);
        }

        let current = self.controller.current();
        let role = self.current_stage().role();
        let targets = self.map.evaluate(role, &self.inputs);

        let mut values = targets;
        for slot in VisualSlot::ALL {
            if let Some(channel) = self.channels[slot.index()].as_mut() {
                values[slot.index()] = channel.advance(targets[slot.index()], dt);
            }
        }

        let mut snapshots = Vec::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter_mut().enumerate() {
            let target = self
                .map
                .field_target(i, current, &field.config().speed, &self.inputs);
            self.field_speeds[i] = target.speed;

            if target.active {
                field.advance(target.speed, elapsed, dt);
            }

            let cfg = field.config();
            snapshots.push(FieldSnapshot {
                handle: FieldHandle(i),
                stage_key: cfg.stage.clone(),
                active: target.active,
                speed: target.speed,
                particle_count: field.len(),
                point_size: cfg.point_size,
                color: cfg.color,
                opacity: cfg.opacity,
            });
        }

        self.frame += 1;

        let stage = self.current_stage();
        VisualState {
            frame: self.frame,
            elapsed,
            stage_index: current,
            stage_key: stage.key().to_string(),
            stage_label: stage.label().to_string(),
            values,
            targets,
            fields: snapshots,
        }
    }

    /// Manual navigation. An invalid jump leaves the stage unchanged.
    pub fn request_stage(&mut self, request: StageRequest) -> Result<usize, StageError> {
        let before = self.controller.current();
        let result = self.controller.request(request);
        match &result {
            Ok(_) => self.log_transition(before),
            Err(e) => log::debug!("stage request {:?} rejected: {}", request, e),
        }
        result
    }

    /// Jump to the stage with the given key.
    pub fn jump_to_key(&mut self, key: &str) -> Result<usize, StageError> {
        let index = self
            .sequence
            .index_of(key)
            .ok_or_else(|| StageError::UnknownKey(key.to_string()))?;
        self.request_stage(StageRequest::JumpTo(index))
    }

    pub fn set_auto_advance(&mut self, enabled: bool, period: Duration) {
        log::debug!("auto-advance {} ({:?})", if enabled { "on" } else { "off" }, period);
        self.controller.set_auto_advance(enabled, period);
    }

    /// Values outside [0, 1] are clamped.
    pub fn set_inputs(&mut self, flow: f32, condensation: f32) {
        self.inputs = ControlInputs::new(flow, condensation);
    }

    pub fn inputs(&self) -> ControlInputs {
        self.inputs
    }

    pub fn current_stage(&self) -> &Stage {
        // The controller keeps the ordinal inside the sequence.
        &self.sequence[self.controller.current()]
    }

    pub fn stage_index(&self) -> usize {
        self.controller.current()
    }

    pub fn sequence(&self) -> &StageSequence {
        &self.sequence
    }

    pub fn controller(&self) -> &StageController {
        &self.controller
    }

    pub fn visual_map(&self) -> &StageVisualMap {
        &self.map
    }

    pub fn fields(&self) -> &[ParticleField] {
        &self.fields
    }

    pub fn field(&self, handle: FieldHandle) -> Option<&ParticleField> {
        self.fields.get(handle.0)
    }

    pub fn field_positions(&self, handle: FieldHandle) -> Option<&[Vec3]> {
        self.field(handle).map(|f| f.positions())
    }

    /// Speed each field was given on the last tick.
    pub fn field_speeds(&self) -> &[f32] {
        &self.field_speeds
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn log_transition(&self, before: usize) {
        let after = self.controller.current();
        if after != before {
            log::info!(
                "stage {} -> {} ({})",
                self.sequence.get(before).map(|s| s.key()).unwrap_or("?"),
                self.current_stage().key(),
                self.current_stage().label(),
            );
        }
    }
}
