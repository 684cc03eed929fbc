//! Plant driver - command channel, scripts, metrics, and the headless frame loop

mod command;
mod metrics;
mod runner;
mod script;

pub use command::*;
pub use metrics::*;
pub use runner::*;
pub use script::*;
