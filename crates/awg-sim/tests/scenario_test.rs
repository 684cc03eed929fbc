//! End-to-end stage scenarios
//!
//! Drives a six-stage plant through manual and automatic stage changes and
//! checks what the renderer would see after each tick.

use std::time::Duration;

use awg_sim::{
    ControlInputs, SimConfig, Simulation, StageDef, StageError, StageRequest, StageRole,
    VisualSlot,
};

const DT: f32 = 0.016;

fn six_stage_config() -> SimConfig {
    let stages = vec![
        StageDef::new("air", "Air Intake", StageRole::AirIntake),
        StageDef::new("condensation", "Condensation", StageRole::Condensation),
        StageDef::new("filtration", "Filtration", StageRole::Filtration),
        StageDef::new("uv", "UV Treatment", StageRole::UvTreatment),
        StageDef::new("dispense", "Dispense", StageRole::Dispense),
        StageDef::new("mineral", "Mineralization", StageRole::Mineralization),
    ];
    let mut config = SimConfig::from_stages("scenario", stages);
    config.auto_advance.enabled = false;
    config.inputs = ControlInputs::new(0.62, 0.58);
    config
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

/// First tick on the air stage: fan at full rate, condenser idle, only the
/// intake field streaming.
#[test]
fn test_initial_air_stage_outputs() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    let state = sim.tick(DT, DT);

    assert_eq!(state.stage_key, "air");
    assert!(
        approx(state.value(VisualSlot::FanRotation), 7.4),
        "fan rotation = {}",
        state.value(VisualSlot::FanRotation)
    );
    assert!(approx(state.target(VisualSlot::CondenserGlow), 0.08));

    for field in &state.fields {
        assert_eq!(field.active, field.stage_key == "air", "field {}", field.stage_key);
    }
}

/// Glow snaps on the first tick after a stage change; tank levels only creep.
#[test]
fn test_stage_change_glow_snaps_levels_lag() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    let before = sim.tick(DT, DT);
    let prefilter_before = before.value(VisualSlot::PrefilterLevel);

    sim.request_stage(StageRequest::Next).unwrap();
    let after = sim.tick(2.0 * DT, DT);

    assert_eq!(after.stage_key, "condensation");
    let expected_glow = 0.25 + 0.58 * 0.9;
    assert!(approx(after.target(VisualSlot::CondenserGlow), expected_glow));
    assert!(approx(after.value(VisualSlot::CondenserGlow), expected_glow));

    let target = after.target(VisualSlot::PrefilterLevel);
    let value = after.value(VisualSlot::PrefilterLevel);
    assert!(target < prefilter_before, "condensation lowers the pre-filter tank");
    let moved = (prefilter_before - value) / (prefilter_before - target);
    assert!(
        moved > 0.0 && moved < 0.1,
        "level should move only fractionally, moved {:.3} of the gap",
        moved
    );
}

#[test]
fn test_manual_navigation_clamps() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();

    assert_eq!(sim.request_stage(StageRequest::Previous), Ok(0));

    sim.request_stage(StageRequest::JumpTo(5)).unwrap();
    assert_eq!(sim.request_stage(StageRequest::Next), Ok(5));
    assert_eq!(sim.tick(DT, DT).stage_key, "mineral");

    assert_eq!(sim.request_stage(StageRequest::Reset), Ok(0));
}

#[test]
fn test_out_of_range_jump_reports_and_keeps_stage() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    sim.request_stage(StageRequest::JumpTo(2)).unwrap();

    let err = sim.request_stage(StageRequest::JumpTo(6)).unwrap_err();
    assert_eq!(err, StageError::OutOfRange { index: 6, count: 6 });
    assert_eq!(sim.tick(DT, DT).stage_key, "filtration");
}

/// Auto-advance from the last stage wraps to the first.
#[test]
fn test_auto_advance_wraps_from_last_stage() {
    let mut config = six_stage_config();
    config.start_stage = 5;
    let mut sim = Simulation::new(config).unwrap();
    sim.set_auto_advance(true, Duration::from_millis(2800));

    let mut elapsed = 0.0;
    let mut seen = Vec::new();
    for _ in 0..400 {
        elapsed += DT;
        let state = sim.tick(elapsed, DT);
        if seen.last() != Some(&state.stage_index) {
            seen.push(state.stage_index);
        }
    }

    // 6.4 s at 2.8 s per stage: two transitions.
    assert_eq!(seen, vec![5, 0, 1]);
}

#[test]
fn test_disabling_auto_advance_freezes_stage() {
    let mut config = six_stage_config();
    config.auto_advance.enabled = true;
    config.auto_advance.period_ms = 1000;
    let mut sim = Simulation::new(config).unwrap();

    let mut elapsed = 0.0;
    for _ in 0..70 {
        elapsed += DT;
        sim.tick(elapsed, DT);
    }
    assert_eq!(sim.stage_index(), 1);

    sim.set_auto_advance(false, Duration::from_millis(1000));
    for _ in 0..500 {
        elapsed += DT;
        sim.tick(elapsed, DT);
    }
    assert_eq!(sim.stage_index(), 1);
}

/// Fields of inactive stages do not move, and resume from the frozen state.
#[test]
fn test_inactive_fields_freeze_and_resume() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    let intake = sim.tick(DT, DT).fields[0].handle;
    let frozen_condensation = sim.fields()[1].positions().to_vec();

    let mut elapsed = DT;
    for _ in 0..50 {
        elapsed += DT;
        sim.tick(elapsed, DT);
    }
    assert_eq!(sim.fields()[1].positions(), &frozen_condensation[..]);

    sim.request_stage(StageRequest::Next).unwrap();
    let frozen_intake = sim.field_positions(intake).unwrap().to_vec();
    for _ in 0..50 {
        elapsed += DT;
        sim.tick(elapsed, DT);
    }
    assert_eq!(sim.field_positions(intake).unwrap(), &frozen_intake[..]);
    assert_ne!(sim.fields()[1].positions(), &frozen_condensation[..]);
}

#[test]
fn test_field_speed_tracks_input() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    sim.set_inputs(0.0, 0.58);
    let slow = sim.tick(DT, DT).fields[0].speed;
    sim.set_inputs(1.0, 0.58);
    let fast = sim.tick(2.0 * DT, DT).fields[0].speed;

    assert!(approx(slow, 0.2));
    assert!(approx(fast, 0.95));
}

#[test]
fn test_inputs_clamped_on_set() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    sim.set_inputs(4.0, -1.0);
    assert_eq!(sim.inputs(), ControlInputs::new(1.0, 0.0));

    let state = sim.tick(DT, DT);
    assert!(approx(state.value(VisualSlot::FanRotation), 11.2));
}

#[test]
fn test_named_slot_lookup() {
    let mut sim = Simulation::new(six_stage_config()).unwrap();
    let state = sim.tick(DT, DT);

    let names: Vec<&str> = state.named_values().map(|(n, _)| n).collect();
    assert_eq!(
        names,
        ["fan_rotation", "condenser_glow", "uv_glow", "prefilter_level", "clean_level"]
    );
    assert_eq!(
        state.value_by_name("uv_glow"),
        Some(state.value(VisualSlot::UvGlow))
    );
}

/// A tuning file with `.nan` levels still ticks through stage changes, and
/// the tank level falls back to its stock value.
#[test]
fn test_nan_level_tuning_from_yaml_ticks() {
    let yaml = serde_yaml::to_string(&six_stage_config()).unwrap();
    let patched = yaml.replacen("high: 0.8\n", "high: .nan\n", 1);
    assert_ne!(patched, yaml);

    let config: SimConfig = serde_yaml::from_str(&patched).unwrap();
    assert!(config.tuning.prefilter_level.high.is_nan());

    let mut sim = Simulation::new(config).unwrap();
    let mut elapsed = DT;
    sim.tick(elapsed, DT);
    for _ in 0..5 {
        sim.request_stage(StageRequest::Next).unwrap();
        elapsed += DT;
        let state = sim.tick(elapsed, DT);
        assert!(state.value(VisualSlot::PrefilterLevel).is_finite());
        assert!(state.value(VisualSlot::CleanLevel).is_finite());
    }

    let state = sim.tick(elapsed + DT, DT);
    assert!(approx(state.target(VisualSlot::PrefilterLevel), 0.8));
}
