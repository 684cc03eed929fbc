//! Stage walkthrough diagnostic - cycles every stage and prints slot values
//!
//! Shows the instantaneous slots jumping on each stage change while the tank
//! levels ease toward their new targets.
//!
//! Run with: cargo run --example stage_walkthrough -p awg-sim

use awg_sim::{SimConfig, Simulation, VisualSlot};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              WATER GENERATOR STAGE WALKTHROUGH               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = SimConfig::walkthrough();
    let period = config.auto_advance.period().as_secs_f32();
    let stage_count = config.stages.len();
    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("failed to build simulation: {}", e);
            return;
        }
    };

    let dt = 1.0 / 60.0;
    let total_frames = ((period * (stage_count as f32 + 1.0)) / dt) as usize;

    println!(
        "{:>6} {:>16} {:>8} {:>8} {:>8} {:>9} {:>9} {:>7}",
        "Time", "Stage", "Fan", "Cond", "UV", "PreFilt", "Clean", "Speed"
    );

    let mut elapsed = 0.0f32;
    let mut last_stage = usize::MAX;
    for frame in 0..total_frames {
        elapsed += dt;
        let state = sim.tick(elapsed, dt);

        // Print on every stage change and twice per second in between.
        if state.stage_index != last_stage || frame % 30 == 0 {
            let speed = state.active_field().map(|f| f.speed).unwrap_or(0.0);
            println!(
                "{:>6.2} {:>16} {:>8.3} {:>8.3} {:>8.3} {:>9.3} {:>9.3} {:>7.3}",
                elapsed,
                state.stage_label,
                state.value(VisualSlot::FanRotation),
                state.value(VisualSlot::CondenserGlow),
                state.value(VisualSlot::UvGlow),
                state.value(VisualSlot::PrefilterLevel),
                state.value(VisualSlot::CleanLevel),
                speed,
            );
            last_stage = state.stage_index;
        }
    }

    let total: usize = sim.fields().iter().map(|f| f.len()).sum();
    println!("\nFrames: {} | Particles: {}", sim.frame(), total);
}
