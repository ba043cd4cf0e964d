mod durations;
mod engine;
mod phase;

pub use durations::Durations;
pub use engine::{
    format_clock, StatusMessage, StatusTtl, TimerEngine, TimerSnapshot, SESSIONS_PER_POMODORO,
};
pub(crate) use engine::now_ms;
pub use phase::{MinuteBounds, Phase};
