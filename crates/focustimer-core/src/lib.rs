//! # focustimer Core Library
//!
//! This library provides the core logic for focustimer, a short-sprint
//! Pomodoro timer aimed at people who work best in brief bursts of focus.
//! Everything is usable from the standalone CLI; any other front end is a
//! thin presentation layer over the same core.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-driven state machine cycling Work, Short Break
//!   and Long Break phases, with overtime and live duration changes
//! - **Focus Timer**: Hosts the engine and calls its collaborators, the
//!   settings store and the notification sink
//! - **Driver**: `tokio` task that ticks once per second while running
//! - **Storage**: SQLite key-value settings store and TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`FocusTimer`]: Engine plus collaborators
//! - [`TimerDriver`]: Real-time tick cadence and snapshot subscription
//! - [`Database`]: Settings persistence
//! - [`Config`]: Application configuration management

pub mod driver;
pub mod error;
pub mod events;
pub mod focus;
pub mod input;
pub mod sink;
pub mod storage;
pub mod timer;

pub use driver::TimerDriver;
pub use error::{ConfigError, CoreError, SinkError, StoreError};
pub use events::{Attributes, Event, Scalar};
pub use focus::FocusTimer;
pub use input::{Command, Keymap};
pub use sink::{FanoutSink, NotificationSink, NullSink, TracingSink};
pub use storage::{
    Config, Database, MemoryStore, PersistenceStore, SessionSnapshot, StorageInfo, UserDataExport,
};
pub use timer::{Durations, Phase, TimerEngine, TimerSnapshot};
