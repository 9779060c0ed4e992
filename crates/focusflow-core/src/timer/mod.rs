mod engine;
mod mode;

pub use engine::{SessionEngine, TaskLedger};
pub use mode::{format_clock, Durations, TimerMode};
