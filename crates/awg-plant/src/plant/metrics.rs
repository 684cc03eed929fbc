use std::collections::VecDeque;
use std::time::Instant;

use awg_sim::VisualState;

/// Mean over the most recent `window` samples.
#[derive(Clone, Debug)]
pub struct RollingAverage {
    samples: VecDeque<f32>,
    window: usize,
    sum: f32,
}

impl RollingAverage {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.window {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }
        self.samples.push_back(sample);
        self.sum += sample;
    }

    /// Zero until the first sample arrives.
    pub fn average(&self) -> f32 {
        match self.samples.len() {
            0 => 0.0,
            n => self.sum / n as f32,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Session metrics for a headless run
pub struct RunMetrics {
    last_tick: Option<Instant>,
    fps_avg: RollingAverage,
    frames: u64,
    transitions: u32,
    rejected_commands: u32,
    last_stage: Option<usize>,
    /// Simulated seconds spent on each stage ordinal.
    stage_time: Vec<f32>,
}

impl RunMetrics {
    pub fn new(stage_count: usize) -> Self {
        Self {
            last_tick: None,
            fps_avg: RollingAverage::new(60),
            frames: 0,
            transitions: 0,
            rejected_commands: 0,
            last_stage: None,
            stage_time: vec![0.0; stage_count],
        }
    }

    /// Record a completed tick.
    pub fn record(&mut self, state: &VisualState, dt: f32) {
        self.frames += 1;

        if let Some(prev) = self.last_stage {
            if prev != state.stage_index {
                self.transitions += 1;
            }
        }
        self.last_stage = Some(state.stage_index);

        if let Some(t) = self.stage_time.get_mut(state.stage_index) {
            *t += dt.max(0.0);
        }

        let now = Instant::now();
        if let Some(last) = self.last_tick {
            let wall = now.duration_since(last).as_secs_f32();
            if wall > 0.0 {
                self.fps_avg.push(1.0 / wall);
            }
        }
        self.last_tick = Some(now);
    }

    pub fn record_rejected(&mut self) {
        self.rejected_commands += 1;
    }

    pub fn fps(&self) -> f32 {
        self.fps_avg.average()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn rejected_commands(&self) -> u32 {
        self.rejected_commands
    }

    pub fn stage_time(&self) -> &[f32] {
        &self.stage_time
    }

    pub fn format_summary(&self) -> String {
        format!(
            "FPS: {:.1} | Frames: {} | Transitions: {} | Rejected: {}",
            self.fps(),
            self.frames,
            self.transitions,
            self.rejected_commands
        )
    }

    /// One line per stage; `labels` are indexed by stage ordinal.
    pub fn format_stages(&self, labels: &[&str]) -> String {
        let total: f32 = self.stage_time.iter().sum();
        let mut output = String::from("Stage Time:\n");
        for (i, secs) in self.stage_time.iter().enumerate() {
            let share = if total > 0.0 { secs / total * 100.0 } else { 0.0 };
            output.push_str(&format!(
                "  {}: {:<16} {:>7.2}s ({:.1}%)\n",
                i + 1,
                labels.get(i).copied().unwrap_or("?"),
                secs,
                share
            ));
        }
        output
    }
}
