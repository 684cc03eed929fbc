//! Headless driver for the water generator simulation.
//!
//! Plays the parts of the render loop and the UI around [`awg_sim::Simulation`]:
//! feeds it elapsed time every frame and forwards user commands between ticks.

pub mod plant;

pub use plant::{Command, ControlHandle, Runner, RunMetrics, Script, ScriptEvent};
