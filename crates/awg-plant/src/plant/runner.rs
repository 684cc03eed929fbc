//! Headless frame loop - stands in for the render loop and the UI
//!
//! Each step: release due script events, drain the command queue, tick the
//! simulation (unless paused), record metrics.

use std::time::{Duration, Instant};

use awg_sim::{Simulation, VisualState};

use super::command::{command_channel, Command, CommandQueue, ControlHandle};
use super::metrics::RunMetrics;
use super::script::{Script, ScriptPlayer};

pub struct Runner {
    sim: Simulation,
    handle: ControlHandle,
    queue: CommandQueue,
    script: Option<ScriptPlayer>,
    metrics: RunMetrics,
    paused: bool,
    elapsed: f32,
    last_state: Option<VisualState>,
}

impl Runner {
    pub fn new(sim: Simulation) -> Self {
        let (handle, queue) = command_channel();
        let metrics = RunMetrics::new(sim.sequence().len());
        Self {
            sim,
            handle,
            queue,
            script: None,
            metrics,
            paused: false,
            elapsed: 0.0,
            last_state: None,
        }
    }

    pub fn with_script(mut self, script: Script) -> Self {
        log::info!("script `{}`: {} events", script.name, script.events.len());
        self.script = Some(ScriptPlayer::new(script));
        self
    }

    /// A handle UI code can use from any thread.
    pub fn handle(&self) -> ControlHandle {
        self.handle.clone()
    }

    /// Advance the session clock by `dt` seconds and return the latest state.
    pub fn step(&mut self, dt: f32) -> &VisualState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        if let Some(player) = self.script.as_mut() {
            let now_ms = (self.elapsed * 1000.0) as u64;
            for cmd in player.due(now_ms) {
                self.handle.send(cmd);
            }
        }

        for cmd in self.queue.drain() {
            self.apply(cmd);
        }

        let state = if self.paused {
            match self.last_state.take() {
                Some(state) => state,
                // Nothing rendered yet: produce a state without moving anything.
                None => self.sim.tick(self.elapsed, 0.0),
            }
        } else {
            let state = self.sim.tick(self.elapsed, dt);
            self.metrics.record(&state, dt);
            state
        };

        self.last_state.insert(state)
    }

    /// Run on a virtual clock for `seconds` at `fps`, without sleeping.
    ///
    /// `on_second` is called after each whole simulated second.
    pub fn run_for<F>(&mut self, seconds: f32, fps: f32, mut on_second: F)
    where
        F: FnMut(&Runner),
    {
        let fps = fps.max(1.0);
        let dt = 1.0 / fps;
        let frames = (seconds.max(0.0) * fps).round() as u64;
        let mut next_report = 1.0;

        for _ in 0..frames {
            self.step(dt);
            if self.elapsed + dt * 0.5 >= next_report {
                on_second(self);
                next_report += 1.0;
            }
        }
    }

    /// Run paced against the wall clock, sleeping between frames.
    pub fn run_realtime<F>(&mut self, seconds: f32, fps: f32, mut on_second: F)
    where
        F: FnMut(&Runner),
    {
        let frame_time = Duration::from_secs_f32(1.0 / fps.max(1.0));
        let start = Instant::now();
        let mut last = start;
        let mut next_report = 1.0;

        while start.elapsed().as_secs_f32() < seconds {
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;

            self.step(dt);
            if self.elapsed >= next_report {
                on_second(self);
                next_report += 1.0;
            }

            let spent = now.elapsed();
            if spent < frame_time {
                std::thread::sleep(frame_time - spent);
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        log::debug!("command {:?}", cmd);

        if let Some(request) = cmd.stage_request() {
            if let Err(e) = self.sim.request_stage(request) {
                log::warn!("{}", e);
                self.metrics.record_rejected();
            }
            return;
        }

        match cmd {
            Command::JumpToKey { key } => {
                if let Err(e) = self.sim.jump_to_key(&key) {
                    log::warn!("{}", e);
                    self.metrics.record_rejected();
                }
            }
            Command::SetAutoAdvance { enabled, period_ms } => {
                self.sim
                    .set_auto_advance(enabled, Duration::from_millis(period_ms));
            }
            Command::SetInputs { flow, condensation } => {
                self.sim.set_inputs(flow, condensation);
            }
            Command::TogglePause => self.toggle_pause(),
            Command::Next | Command::Previous | Command::Reset | Command::JumpTo { .. } => {}
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        log::info!("{}", if self.paused { "paused" } else { "resumed" });

        if !self.paused {
            // Restart the auto-advance period so paused time is not caught up.
            let ctl = self.sim.controller();
            let (enabled, period) = (ctl.auto_advance_enabled(), ctl.auto_advance_period());
            self.sim.set_auto_advance(enabled, period);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn last_state(&self) -> Option<&VisualState> {
        self.last_state.as_ref()
    }

    pub fn script_finished(&self) -> bool {
        self.script.as_ref().map_or(true, |p| p.is_finished())
    }

    /// Get status string for display
    pub fn status_string(&self) -> String {
        let stage = self.sim.current_stage();
        let inputs = self.sim.inputs();
        let active = self
            .last_state
            .as_ref()
            .and_then(|s| s.active_field())
            .map(|f| format!("{} @ {:.2}", f.stage_key, f.speed))
            .unwrap_or_else(|| "none".to_string());

        format!(
            "t={:>6.2}s | Stage: {} ({}/{}) | Flow: {:.2} Cond: {:.2} | Field: {} | Paused: {} | Auto: {}",
            self.elapsed,
            stage.label(),
            stage.ordinal() + 1,
            self.sim.sequence().len(),
            inputs.flow(),
            inputs.condensation(),
            active,
            self.paused,
            self.sim.controller().auto_advance_enabled(),
        )
    }

    /// Stage labels in ordinal order, for [`RunMetrics::format_stages`].
    pub fn stage_labels(&self) -> Vec<&str> {
        self.sim.sequence().iter().map(|s| s.label()).collect()
    }
}
