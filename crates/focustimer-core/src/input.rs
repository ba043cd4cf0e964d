//! Input adapter: raw key presses to timer commands.
//!
//! Presentation layers translate whatever their platform delivers (terminal
//! lines, key events) into [`Command`]s and hand them to the driver. The
//! timer never sees keys.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::events::Event;
use crate::focus::FocusTimer;
use crate::storage::ShortcutsConfig;
use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Start,
    Pause,
    Reset,
    Skip,
    SetDuration { phase: Phase, minutes: i64 },
    MicroSprint { minutes: i64 },
    SetTask(String),
    ClearTask,
    /// `action` reached through a keymap binding on `key`.
    Shortcut { key: String, action: Box<Command> },
}

impl Command {
    /// Short name for logs; never includes task text.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Toggle => "toggle",
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Reset => "reset",
            Command::Skip => "skip",
            Command::SetDuration { .. } => "set_duration",
            Command::MicroSprint { .. } => "micro_sprint",
            Command::SetTask(_) => "set_task",
            Command::ClearTask => "clear_task",
            Command::Shortcut { action, .. } => action.name(),
        }
    }

    /// Whether the command starts a fresh countdown, so the tick cadence
    /// should restart from it.
    pub fn restarts_clock(&self) -> bool {
        match self {
            Command::MicroSprint { .. } => true,
            Command::Shortcut { action, .. } => action.restarts_clock(),
            _ => false,
        }
    }

    pub fn apply(self, timer: &mut FocusTimer) -> Vec<Event> {
        match self {
            Command::Toggle => timer.toggle(),
            Command::Start => timer.start(),
            Command::Pause => timer.pause(),
            Command::Reset => timer.reset(),
            Command::Skip => timer.skip(),
            Command::SetDuration { phase, minutes } => timer.set_duration(phase, minutes),
            Command::MicroSprint { minutes } => timer.start_micro_sprint(minutes),
            Command::SetTask(text) => {
                timer.set_task(&text);
                Vec::new()
            }
            Command::ClearTask => {
                timer.clear_task();
                Vec::new()
            }
            Command::Shortcut { key, action } => {
                let mut events = vec![timer.record_shortcut(&key, action.name())];
                events.extend((*action).apply(timer));
                events
            }
        }
    }

    /// Parse a binding action such as `toggle`, `skip` or `sprint:10`.
    ///
    /// # Errors
    /// Returns an error for unknown actions or a malformed sprint length.
    pub fn parse_action(action: &str) -> Result<Self, ConfigError> {
        let action = action.trim();
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: format!("shortcuts.bindings ({action})"),
            message: message.to_string(),
        };
        match action {
            "toggle" => Ok(Command::Toggle),
            "start" => Ok(Command::Start),
            "pause" => Ok(Command::Pause),
            "reset" => Ok(Command::Reset),
            "skip" => Ok(Command::Skip),
            "clear-task" => Ok(Command::ClearTask),
            other => match other.strip_prefix("sprint:") {
                Some(minutes) => minutes
                    .parse::<i64>()
                    .map(|minutes| Command::MicroSprint { minutes })
                    .map_err(|_| invalid("sprint length must be whole minutes")),
                None => Err(invalid("unknown action")),
            },
        }
    }
}

/// Key → command table built from the shortcuts config.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: BTreeMap<String, Command>,
}

impl Keymap {
    /// Build from config. Unparseable bindings are reported, not skipped.
    ///
    /// # Errors
    /// Returns the first binding whose action cannot be parsed.
    pub fn from_config(config: &ShortcutsConfig) -> Result<Self, ConfigError> {
        let bindings = config
            .bindings
            .iter()
            .map(|(key, action)| Ok((key.clone(), Command::parse_action(action)?)))
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self { bindings })
    }

    /// Bind each preset's minute count (`"5"`, `"10"`) to a sprint of that
    /// length. Explicit bindings win over presets.
    pub fn with_presets(mut self, presets: &[u32]) -> Self {
        for &minutes in presets {
            self.bindings
                .entry(minutes.to_string())
                .or_insert(Command::MicroSprint {
                    minutes: i64::from(minutes),
                });
        }
        self
    }

    pub fn command_for(&self, key: &str) -> Option<Command> {
        self.bindings.get(key).cloned()
    }

    /// Like [`Keymap::command_for`], wrapped so that applying it also
    /// reports the key press.
    pub fn shortcut(&self, key: &str) -> Option<Command> {
        self.command_for(key).map(|action| Command::Shortcut {
            key: key.to_string(),
            action: Box::new(action),
        })
    }

    /// Keys bound to micro-sprints, with their lengths, in key order.
    pub fn sprint_presets(&self) -> Vec<(&str, i64)> {
        self.bindings
            .iter()
            .filter_map(|(key, cmd)| match cmd {
                Command::MicroSprint { minutes } => Some((key.as_str(), *minutes)),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
