//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It owns no threads and
//! performs no I/O - the caller invokes `tick()` once per elapsed second
//! while the engine is running (see [`crate::driver`]).
//!
//! ## State Transitions
//!
//! ```text
//! Work --(complete/skip)--> ShortBreak | LongBreak --(complete/skip)--> Work
//! ```
//!
//! Each phase counts down from its configured duration. The tick that lands
//! exactly on zero completes the phase. A countdown that is held past zero
//! keeps going negative and is flagged as overtime.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start(false);
//! // Once per second:
//! let events = engine.tick(); // non-empty when the phase completes
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::durations::Durations;
use super::phase::Phase;
use crate::events::Event;

/// Work sessions per Pomodoro; every Nth work session earns a long break.
pub const SESSIONS_PER_POMODORO: u32 = 4;

const SESSION_MILESTONES: [u32; 5] = [5, 10, 25, 50, 100];

/// Advisory message shown after a transition. Carries no engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub id: u64,
    pub text: String,
    pub expires_at_ms: u64,
}

impl StatusMessage {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// How long status messages stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTtl {
    pub completion_ms: u64,
    pub sprint_ms: u64,
}

impl Default for StatusTtl {
    fn default() -> Self {
        Self {
            completion_ms: 5_000,
            sprint_ms: 3_000,
        }
    }
}

/// Read-only view of the engine handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_label: String,
    pub remaining_secs: i64,
    pub total_secs: u64,
    pub is_running: bool,
    pub is_overtime: bool,
    pub session_number: u32,
    pub pomodoro_number: u32,
    /// 0.0 .. 1.0 progress within the phase; 0.0 while in overtime.
    pub progress: f64,
    pub durations: Durations,
    pub status_message: Option<String>,
    /// `mm:ss`, prefixed with `-` in overtime.
    pub display: String,
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    durations: Durations,
    phase: Phase,
    remaining_secs: i64,
    running: bool,
    overtime: bool,
    session_number: u32,
    status: Option<StatusMessage>,
    next_status_id: u64,
    status_ttl: StatusTtl,
}

impl TimerEngine {
    /// Create an idle engine at the start of the first work session.
    pub fn new(durations: Durations) -> Self {
        Self::restore(durations, 1, Phase::Work)
    }

    /// Create an idle engine continuing a previously saved session.
    pub fn restore(durations: Durations, session_number: u32, phase: Phase) -> Self {
        Self {
            durations,
            phase,
            remaining_secs: durations.get(phase) as i64,
            running: false,
            overtime: false,
            session_number: session_number.max(1),
            status: None,
            next_status_id: 1,
            status_ttl: StatusTtl::default(),
        }
    }

    pub fn with_status_ttl(mut self, ttl: StatusTtl) -> Self {
        self.status_ttl = ttl;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> i64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_overtime(&self) -> bool {
        self.overtime
    }

    pub fn session_number(&self) -> u32 {
        self.session_number
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn total_secs(&self) -> u64 {
        self.durations.get(self.phase)
    }

    /// Pomodoro the current session belongs to (1-based).
    pub fn pomodoro_number(&self) -> u32 {
        self.session_number.div_ceil(SESSIONS_PER_POMODORO)
    }

    /// 0.0 .. 1.0 progress within current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 || self.overtime {
            return 0.0;
        }
        (1.0 - (self.remaining_secs as f64 / total as f64)).clamp(0.0, 1.0)
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_at(now_ms())
    }

    /// Snapshot as seen at `now_ms`; an expired status message is hidden.
    pub fn snapshot_at(&self, now_ms: u64) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            is_running: self.running,
            is_overtime: self.overtime,
            session_number: self.session_number,
            pomodoro_number: self.pomodoro_number(),
            progress: self.progress(),
            durations: self.durations,
            status_message: self
                .status
                .as_ref()
                .filter(|m| !m.is_expired(now_ms))
                .map(|m| m.text.clone()),
            display: format_clock(self.remaining_secs),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin ticking. Already running is a no-op.
    pub fn start(&mut self, has_task: bool) -> Vec<Event> {
        if self.running {
            return Vec::new();
        }
        self.running = true;
        self.status = None;
        vec![Event::TimerStarted {
            phase: self.phase,
            duration_secs: self.total_secs(),
            has_task,
            at: Utc::now(),
        }]
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.running = false;
        vec![Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            progress_pct: self.elapsed_pct(),
            at: Utc::now(),
        }]
    }

    /// Stop and rewind the current phase. Phase and session are kept.
    pub fn reset(&mut self) -> Vec<Event> {
        let event = Event::TimerReset {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            progress_pct: self.elapsed_pct(),
            at: Utc::now(),
        };
        self.running = false;
        self.remaining_secs = self.total_secs() as i64;
        self.overtime = false;
        self.status = None;
        vec![event]
    }

    /// Complete the current phase immediately, whatever is left on the clock.
    pub fn skip(&mut self) -> Vec<Event> {
        let from = self.phase;
        let mut events = self.complete();
        events.insert(
            0,
            Event::TimerSkipped {
                from,
                to: self.phase,
                session_number: self.session_number,
                at: Utc::now(),
            },
        );
        events
    }

    /// Change a phase's configured duration; out-of-range minutes are clamped.
    ///
    /// An idle engine showing that phase picks up the new value at once; a
    /// running countdown is left alone.
    pub fn set_duration(&mut self, phase: Phase, minutes: i64) -> Vec<Event> {
        let old_minutes = self.durations.minutes(phase);
        let new_minutes = self.durations.set_minutes(phase, minutes);

        if phase == self.phase && !self.running {
            self.remaining_secs = self.durations.get(phase) as i64;
            self.overtime = false;
        }

        if old_minutes == new_minutes {
            return Vec::new();
        }
        vec![Event::DurationChanged {
            phase,
            old_minutes,
            new_minutes,
            at: Utc::now(),
        }]
    }

    /// Start an ad-hoc work sprint without touching the configured work duration.
    pub fn start_micro_sprint(&mut self, minutes: i64) -> Vec<Event> {
        let minutes = Phase::Work.bounds().clamp(minutes);
        self.phase = Phase::Work;
        self.remaining_secs = i64::from(minutes) * 60;
        self.running = true;
        self.overtime = false;
        self.set_status(
            format!("{minutes}-minute micro-sprint started. You've got this!"),
            self.status_ttl.sprint_ms,
        );
        debug!(minutes, "micro-sprint started");
        vec![Event::MicroSprintStarted {
            minutes,
            at: Utc::now(),
        }]
    }

    /// Advance one second. Returns completion events when the phase ends.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            return self.complete();
        }
        if self.remaining_secs < 0 && !self.overtime {
            self.overtime = true;
            debug!(phase = %self.phase, "entered overtime");
        }
        Vec::new()
    }

    /// Clear the status message if it is still the one identified by `id`.
    pub fn expire_status(&mut self, id: u64) -> bool {
        if self.status.as_ref().is_some_and(|m| m.id == id) {
            self.status = None;
            return true;
        }
        false
    }

    /// Show a short-lived advisory (e.g. a failed save) without touching
    /// timer state.
    pub fn post_notice(&mut self, text: impl Into<String>) {
        self.set_status(text.into(), self.status_ttl.sprint_ms);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn next_phase(&self) -> Phase {
        match self.phase {
            Phase::Work if self.session_number % SESSIONS_PER_POMODORO == 0 => Phase::LongBreak,
            Phase::Work => Phase::ShortBreak,
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    fn complete(&mut self) -> Vec<Event> {
        let from = self.phase;
        let was_overtime = self.overtime;
        let next = self.next_phase();

        self.running = false;
        if from.is_break() {
            self.session_number += 1;
        }
        self.phase = next;
        self.remaining_secs = self.total_secs() as i64;
        self.overtime = false;

        let text = match next {
            Phase::LongBreak => "Focus session complete! Time for a long break.",
            Phase::ShortBreak => "Focus session complete! Time for a short break.",
            Phase::Work => "Break over, focus time!",
        };
        self.set_status(text.to_string(), self.status_ttl.completion_ms);
        debug!(%from, to = %next, session = self.session_number, "phase completed");

        let at = Utc::now();
        let mut events = vec![Event::PhaseCompleted {
            from,
            to: next,
            session_number: self.session_number,
            was_overtime,
            at,
        }];

        if from.is_break() {
            let session = self.session_number;
            if session > 1 && session % SESSIONS_PER_POMODORO == 1 {
                events.push(Event::PomodoroCompleted {
                    pomodoro_number: (session - 1) / SESSIONS_PER_POMODORO,
                    total_sessions: session - 1,
                    at,
                });
            }
            if SESSION_MILESTONES.contains(&session) {
                events.push(Event::SessionMilestone {
                    session_number: session,
                    at,
                });
            }
        }
        events
    }

    fn set_status(&mut self, text: String, ttl_ms: u64) {
        let id = self.next_status_id;
        self.next_status_id += 1;
        self.status = Some(StatusMessage {
            id,
            text,
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        });
    }

    fn elapsed_pct(&self) -> u32 {
        let total = self.total_secs() as i64;
        if total == 0 {
            return 0;
        }
        let elapsed = (total - self.remaining_secs).max(0);
        ((elapsed as f64 / total as f64) * 100.0).round() as u32
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

/// Format signed seconds as `mm:ss`, with a leading `-` when negative.
pub fn format_clock(secs: i64) -> String {
    let abs = secs.unsigned_abs();
    let sign = if secs < 0 { "-" } else { "" };
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

pub(crate) fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine_at(phase: Phase, session_number: u32) -> TimerEngine {
        TimerEngine::restore(Durations::default(), session_number, phase)
    }

    fn run_ticks(engine: &mut TimerEngine, n: u32) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(engine.tick());
        }
        events
    }

    #[test]
    fn initial_state() {
        let engine = TimerEngine::default();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.is_running());
        assert!(!engine.is_overtime());
        assert_eq!(engine.session_number(), 1);
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = TimerEngine::default();
        assert_eq!(engine.start(false).len(), 1);
        assert!(engine.start(false).is_empty());
        assert!(engine.is_running());
    }

    #[test]
    fn pause_keeps_remaining() {
        let mut engine = TimerEngine::default();
        engine.start(false);
        run_ticks(&mut engine, 10);
        let events = engine.pause();
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_secs(), 1490);
        match &events[0] {
            Event::TimerPaused { progress_pct, .. } => assert_eq!(*progress_pct, 1),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(engine.pause().is_empty());
        // Ticks while paused change nothing.
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_secs(), 1490);
    }

    #[test]
    fn completion_fires_on_the_tick_that_hits_zero() {
        let mut engine = TimerEngine::default();
        engine.start(false);
        engine.remaining_secs = 1;
        let events = engine.tick();
        assert!(!engine.is_running());
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(matches!(events[0], Event::PhaseCompleted { .. }));
    }

    #[test]
    fn held_zero_runs_into_overtime() {
        let mut engine = TimerEngine::default();
        engine.running = true;
        engine.remaining_secs = 0;

        engine.tick();
        assert_eq!(engine.remaining_secs(), -1);
        assert!(engine.is_overtime());
        assert!(engine.is_running());
        assert_eq!(engine.progress(), 0.0);

        run_ticks(&mut engine, 99);
        assert_eq!(engine.remaining_secs(), -100);
        assert!(engine.is_overtime());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.snapshot().display, "-01:40");
    }

    #[test]
    fn set_duration_clears_overtime_on_idle_phase() {
        let mut engine = TimerEngine::default();
        engine.running = true;
        engine.remaining_secs = 0;
        run_ticks(&mut engine, 5);
        assert!(engine.is_overtime());
        engine.pause();

        engine.set_duration(Phase::Work, 10);
        assert!(!engine.is_overtime());
        assert_eq!(engine.remaining_secs(), 600);
        assert_eq!(engine.snapshot().display, "10:00");
    }

    #[test]
    fn notice_expires_like_a_sprint_message() {
        let mut engine = TimerEngine::default().with_status_ttl(StatusTtl {
            completion_ms: 5_000,
            sprint_ms: 1_000,
        });
        engine.post_notice("Couldn't save task");
        let msg = engine.status().cloned().unwrap();
        assert_eq!(msg.text, "Couldn't save task");
        assert!(engine.snapshot_at(msg.expires_at_ms - 1).status_message.is_some());
        assert!(engine.snapshot_at(msg.expires_at_ms).status_message.is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn fourth_work_session_routes_to_long_break() {
        let mut engine = engine_at(Phase::Work, 4);
        engine.skip();
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert_eq!(engine.remaining_secs(), 900);
    }

    #[test]
    fn other_work_sessions_route_to_short_break() {
        for session in 1..=3 {
            let mut engine = engine_at(Phase::Work, session);
            engine.skip();
            assert_eq!(engine.phase(), Phase::ShortBreak, "session {session}");
            assert_eq!(engine.session_number(), session);
        }
    }

    #[test]
    fn break_completion_increments_session() {
        let mut engine = engine_at(Phase::ShortBreak, 2);
        engine.start(false);
        engine.remaining_secs = 1;
        let events = engine.tick();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.session_number(), 3);
        match &events[0] {
            Event::PhaseCompleted {
                from,
                to,
                session_number,
                ..
            } => {
                assert_eq!(*from, Phase::ShortBreak);
                assert_eq!(*to, Phase::Work);
                assert_eq!(*session_number, 3);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn long_break_completion_reports_pomodoro() {
        let mut engine = engine_at(Phase::LongBreak, 4);
        let events = engine.skip();
        assert_eq!(engine.session_number(), 5);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::PomodoroCompleted {
                pomodoro_number: 1,
                total_sessions: 4,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionMilestone { session_number: 5, .. })));
    }

    #[test]
    fn skip_reports_overtime_of_the_finished_phase() {
        let mut engine = TimerEngine::default();
        engine.running = true;
        engine.remaining_secs = 0;
        run_ticks(&mut engine, 3);
        let events = engine.skip();
        assert!(matches!(events[0], Event::TimerSkipped { from: Phase::Work, to: Phase::ShortBreak, .. }));
        assert!(matches!(events[1], Event::PhaseCompleted { was_overtime: true, .. }));
        assert!(!engine.is_overtime());
        assert!(!engine.is_running());
    }

    #[test]
    fn reset_keeps_phase_and_session() {
        let mut engine = TimerEngine::default();
        for _ in 0..5 {
            engine.skip();
        }
        let phase = engine.phase();
        let session = engine.session_number();
        engine.start(false);
        run_ticks(&mut engine, 42);

        engine.reset();
        assert_eq!(engine.phase(), phase);
        assert_eq!(engine.session_number(), session);
        assert!(!engine.is_running());
        assert!(!engine.is_overtime());
        assert_eq!(engine.remaining_secs(), engine.total_secs() as i64);
    }

    #[test]
    fn set_duration_updates_idle_display() {
        let mut engine = TimerEngine::default();
        let events = engine.set_duration(Phase::Work, 9999);
        assert_eq!(engine.durations().get(Phase::Work), 90 * 60);
        assert_eq!(engine.remaining_secs(), 90 * 60);
        assert_eq!(events.len(), 1);

        // Same request again: identical state, nothing to report.
        assert!(engine.set_duration(Phase::Work, 9999).is_empty());
        assert_eq!(engine.durations().get(Phase::Work), 90 * 60);
    }

    #[test]
    fn set_duration_leaves_running_countdown_alone() {
        let mut engine = TimerEngine::default();
        engine.start(false);
        run_ticks(&mut engine, 5);
        engine.set_duration(Phase::Work, 10);
        assert_eq!(engine.remaining_secs(), 1495);
        assert_eq!(engine.durations().get(Phase::Work), 600);

        engine.skip();
        engine.skip();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 600);
    }

    #[test]
    fn set_duration_for_other_phase_keeps_display() {
        let mut engine = TimerEngine::default();
        engine.set_duration(Phase::ShortBreak, 0);
        assert_eq!(engine.durations().get(Phase::ShortBreak), 60);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn micro_sprint_forces_work_without_touching_settings() {
        let mut engine = engine_at(Phase::ShortBreak, 2);
        let events = engine.start_micro_sprint(5);
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(engine.is_running());
        assert_eq!(engine.durations().get(Phase::Work), 1500);
        assert_eq!(engine.session_number(), 2);
        assert!(matches!(events[0], Event::MicroSprintStarted { minutes: 5, .. }));
        assert!(engine.snapshot().status_message.is_some());
    }

    #[test]
    fn status_message_expires_by_time_and_id() {
        let mut engine = TimerEngine::default();
        engine.skip();
        let msg = engine.status().cloned().unwrap();
        assert!(msg.text.contains("short break"));
        assert!(engine.snapshot_at(msg.expires_at_ms - 1).status_message.is_some());
        assert!(engine.snapshot_at(msg.expires_at_ms).status_message.is_none());

        assert!(!engine.expire_status(msg.id + 1));
        assert!(engine.expire_status(msg.id));
        assert!(engine.status().is_none());
    }

    #[test]
    fn start_clears_status_message() {
        let mut engine = TimerEngine::default();
        engine.skip();
        assert!(engine.status().is_some());
        engine.start(false);
        assert!(engine.status().is_none());
    }

    #[test]
    fn format_clock_pads_and_signs() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(-5), "-00:05");
    }

    #[test]
    fn pomodoro_number_groups_four_sessions() {
        assert_eq!(engine_at(Phase::Work, 1).pomodoro_number(), 1);
        assert_eq!(engine_at(Phase::Work, 4).pomodoro_number(), 1);
        assert_eq!(engine_at(Phase::Work, 5).pomodoro_number(), 2);
    }

    proptest! {
        #[test]
        fn each_tick_moves_exactly_one_second(start in 2i64..5_400, ticks in 1u32..200) {
            let mut engine = TimerEngine::default();
            engine.running = true;
            engine.remaining_secs = start;
            let ticks = ticks.min((start - 1) as u32);
            for i in 1..=ticks {
                let before = engine.remaining_secs();
                engine.tick();
                prop_assert_eq!(engine.remaining_secs(), before - 1);
                prop_assert!(engine.is_running(), "stopped after {} ticks", i);
            }
        }

        #[test]
        fn zero_is_never_observed_while_running(start in 1i64..300) {
            let mut engine = TimerEngine::default();
            engine.running = true;
            engine.remaining_secs = start;
            for _ in 0..start {
                engine.tick();
                prop_assert!(!(engine.is_running() && engine.remaining_secs() == 0));
            }
            prop_assert!(!engine.is_running());
            prop_assert_eq!(engine.phase(), Phase::ShortBreak);
        }
    }
}
