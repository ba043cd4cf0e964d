//! Events produced by the timer and the analytics attributes derived from them.
//!
//! Every user-visible action yields an [`Event`]. The presentation layer can
//! render them; the notification sink receives them as a flat
//! `name + attributes` pair via [`Event::name`] and [`Event::attributes`].
//! Attributes never carry free-text task content, only lengths and flags.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        duration_secs: u64,
        has_task: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: i64,
        progress_pct: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: i64,
        progress_pct: u32,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        session_number: u32,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        from: Phase,
        to: Phase,
        session_number: u32,
        was_overtime: bool,
        at: DateTime<Utc>,
    },
    DurationChanged {
        phase: Phase,
        old_minutes: u32,
        new_minutes: u32,
        at: DateTime<Utc>,
    },
    MicroSprintStarted {
        minutes: u32,
        at: DateTime<Utc>,
    },
    /// A group of four work sessions has been finished.
    PomodoroCompleted {
        pomodoro_number: u32,
        total_sessions: u32,
        at: DateTime<Utc>,
    },
    SessionMilestone {
        session_number: u32,
        at: DateTime<Utc>,
    },
    TaskUpdated {
        task_length: usize,
        is_first_task: bool,
        at: DateTime<Utc>,
    },
    TaskCleared {
        at: DateTime<Utc>,
    },
    /// A keymap binding fired. `action` is the bound command's name.
    KeyboardShortcut {
        key: String,
        action: String,
        at: DateTime<Utc>,
    },
}

/// A scalar analytics attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<usize> for Scalar {
    fn from(v: usize) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<Phase> for Scalar {
    fn from(v: Phase) -> Self {
        Scalar::Text(v.as_str().to_string())
    }
}

pub type Attributes = BTreeMap<String, Scalar>;

/// Keys that must never reach an analytics sink.
const SENSITIVE_KEYS: [&str; 5] = ["task_text", "user_id", "email", "name", "ip_address"];
const MAX_TEXT_LEN: usize = 200;

/// Drop sensitive keys and truncate long text values.
pub fn sanitize_attributes(mut attrs: Attributes) -> Attributes {
    attrs.retain(|k, _| !SENSITIVE_KEYS.contains(&k.as_str()));
    for value in attrs.values_mut() {
        if let Scalar::Text(s) = value {
            if s.chars().count() > MAX_TEXT_LEN {
                let truncated: String = s.chars().take(MAX_TEXT_LEN).collect();
                *s = format!("{truncated}...");
            }
        }
    }
    attrs
}

fn round_minutes(secs: i64) -> i64 {
    (secs as f64 / 60.0).round() as i64
}

impl Event {
    /// Analytics event name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_start",
            Event::TimerPaused { .. } => "timer_pause",
            Event::TimerReset { .. } => "timer_reset",
            Event::TimerSkipped { .. } => "timer_skip",
            Event::PhaseCompleted { .. } => "timer_complete",
            Event::DurationChanged { .. } => "duration_change",
            Event::MicroSprintStarted { .. } => "micro_sprint_start",
            Event::PomodoroCompleted { .. } => "pomodoro_complete",
            Event::SessionMilestone { .. } => "session_milestone",
            Event::TaskUpdated { .. } => "task_input",
            Event::TaskCleared { .. } => "task_clear",
            Event::KeyboardShortcut { .. } => "keyboard_shortcut",
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::DurationChanged { at, .. }
            | Event::MicroSprintStarted { at, .. }
            | Event::PomodoroCompleted { at, .. }
            | Event::SessionMilestone { at, .. }
            | Event::TaskUpdated { at, .. }
            | Event::KeyboardShortcut { at, .. }
            | Event::TaskCleared { at } => *at,
        }
    }

    /// Flat scalar attributes for the analytics sink.
    pub fn attributes(&self) -> Attributes {
        let mut a = Attributes::new();
        match self {
            Event::TimerStarted {
                phase,
                duration_secs,
                has_task,
                ..
            } => {
                a.insert("timer_state".into(), (*phase).into());
                a.insert(
                    "duration_minutes".into(),
                    round_minutes(*duration_secs as i64).into(),
                );
                a.insert("has_task".into(), (*has_task).into());
            }
            Event::TimerPaused {
                phase,
                remaining_secs,
                progress_pct,
                ..
            }
            | Event::TimerReset {
                phase,
                remaining_secs,
                progress_pct,
                ..
            } => {
                a.insert("timer_state".into(), (*phase).into());
                a.insert("progress_percentage".into(), (*progress_pct).into());
                a.insert(
                    "time_remaining_minutes".into(),
                    round_minutes(*remaining_secs).into(),
                );
            }
            Event::TimerSkipped {
                from,
                to,
                session_number,
                ..
            } => {
                a.insert("from_state".into(), (*from).into());
                a.insert("to_state".into(), (*to).into());
                a.insert("session_number".into(), (*session_number).into());
            }
            Event::PhaseCompleted {
                from,
                to,
                session_number,
                was_overtime,
                ..
            } => {
                a.insert("timer_state".into(), (*from).into());
                a.insert("next_state".into(), (*to).into());
                a.insert("session_number".into(), (*session_number).into());
                a.insert("was_overtime".into(), (*was_overtime).into());
            }
            Event::DurationChanged {
                phase,
                old_minutes,
                new_minutes,
                ..
            } => {
                a.insert("timer_type".into(), (*phase).into());
                a.insert("old_duration_minutes".into(), (*old_minutes).into());
                a.insert("new_duration_minutes".into(), (*new_minutes).into());
            }
            Event::MicroSprintStarted { minutes, .. } => {
                a.insert("duration_minutes".into(), (*minutes).into());
            }
            Event::PomodoroCompleted {
                pomodoro_number,
                total_sessions,
                ..
            } => {
                a.insert("pomodoro_number".into(), (*pomodoro_number).into());
                a.insert("total_sessions".into(), (*total_sessions).into());
            }
            Event::SessionMilestone { session_number, .. } => {
                a.insert("session_number".into(), (*session_number).into());
                a.insert(
                    "milestone_type".into(),
                    Scalar::Text(format!("{session_number}_sessions")),
                );
            }
            Event::TaskUpdated {
                task_length,
                is_first_task,
                ..
            } => {
                a.insert("task_length".into(), (*task_length).into());
                a.insert("is_first_task".into(), (*is_first_task).into());
            }
            Event::TaskCleared { .. } => {}
            Event::KeyboardShortcut { key, action, .. } => {
                a.insert("shortcut_key".into(), key.as_str().into());
                a.insert("action".into(), action.as_str().into());
            }
        }
        a
    }
}
