//! The hosting layer around [`TimerEngine`].
//!
//! `FocusTimer` owns the engine and its two collaborators. It forwards
//! commands to the engine, hands the resulting events to the notification
//! sink, and keeps the settings store up to date. Collaborator failures are
//! logged here and never change timer state. A failed save also shows a
//! short status notice.

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::events::{sanitize_attributes, Event};
use crate::sink::NotificationSink;
use crate::storage::{normalize_task, Config, PersistenceStore, SessionSnapshot, MAX_TASK_LEN};
use crate::timer::{now_ms, Phase, StatusMessage, TimerEngine, TimerSnapshot};

pub struct FocusTimer {
    engine: TimerEngine,
    store: Box<dyn PersistenceStore>,
    sink: Box<dyn NotificationSink>,
    task: Option<String>,
    analytics_enabled: bool,
    alerts_enabled: bool,
    last_save_ok: bool,
}

impl FocusTimer {
    /// Build a timer from whatever the store holds.
    pub fn open(
        store: impl PersistenceStore + 'static,
        sink: impl NotificationSink + 'static,
        config: &Config,
    ) -> Self {
        Self::open_at(Box::new(store), Box::new(sink), config, now_ms())
    }

    /// Like [`FocusTimer::open`], with an explicit clock for the staleness check.
    pub fn open_at(
        mut store: Box<dyn PersistenceStore>,
        sink: Box<dyn NotificationSink>,
        config: &Config,
        now_ms: u64,
    ) -> Self {
        let durations = match store.load_durations() {
            Ok(Some(d)) => d,
            Ok(None) => config.default_durations(),
            Err(e) => {
                warn!(error = %e, "failed to load durations, using defaults");
                config.default_durations()
            }
        };

        let session = match store.load_session_snapshot() {
            Ok(Some(snap)) if !snap.is_stale(now_ms) => Some(snap),
            Ok(Some(snap)) => {
                debug!(saved_at_ms = snap.saved_at_ms, "discarding stale session");
                if let Err(e) = store.clear_session_snapshot() {
                    warn!(error = %e, "failed to clear stale session");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to load session, starting fresh");
                None
            }
        };

        let task = match store.load_current_task() {
            Ok(task) => task.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to load current task");
                None
            }
        };

        let engine = match session {
            Some(snap) => TimerEngine::restore(durations, snap.session_number, snap.phase),
            None => TimerEngine::new(durations),
        }
        .with_status_ttl(config.status_ttl());

        Self {
            engine,
            store,
            sink,
            task,
            analytics_enabled: config.analytics.enabled,
            alerts_enabled: config.alerts_enabled(),
            last_save_ok: true,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.engine.status()
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// Whether the most recent write to the store succeeded.
    pub fn last_save_ok(&self) -> bool {
        self.last_save_ok
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start(self.task.is_some());
        self.dispatch(events)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause();
        self.dispatch(events)
    }

    /// Start when idle, pause when running.
    pub fn toggle(&mut self) -> Vec<Event> {
        if self.engine.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) -> Vec<Event> {
        let events = self.engine.reset();
        self.dispatch(events)
    }

    pub fn skip(&mut self) -> Vec<Event> {
        let events = self.engine.skip();
        self.dispatch(events)
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.engine.tick();
        self.dispatch(events)
    }

    /// Clamp and apply a phase duration, then persist all durations.
    ///
    /// A failed write shows a notice; see [`FocusTimer::last_save_ok`].
    pub fn set_duration(&mut self, phase: Phase, minutes: i64) -> Vec<Event> {
        let events = self.engine.set_duration(phase, minutes);
        if !events.is_empty() && !self.save_durations() {
            self.engine.post_notice("Couldn't save durations");
        }
        self.dispatch(events)
    }

    pub fn start_micro_sprint(&mut self, minutes: i64) -> Vec<Event> {
        let events = self.engine.start_micro_sprint(minutes);
        self.dispatch(events)
    }

    /// Set the current task label. Returns whether it was saved.
    ///
    /// Blank or over-long text is rejected and leaves the current task as is.
    /// Either failure shows a notice.
    pub fn set_task(&mut self, text: &str) -> bool {
        let Some(text) = normalize_task(text) else {
            self.engine.post_notice(format!(
                "Task not saved: it must be non-empty and under {MAX_TASK_LEN} characters"
            ));
            return false;
        };
        let is_first_task = self.task.is_none();
        let result = self.store.save_current_task(text);
        let saved = self.record_write(result, "save current task");
        if !saved {
            self.engine.post_notice("Couldn't save task");
        }
        self.task = Some(text.to_string());
        self.emit(&Event::TaskUpdated {
            task_length: text.chars().count(),
            is_first_task,
            at: chrono::Utc::now(),
        });
        saved
    }

    /// Forget the current task label. Returns whether the store was updated.
    pub fn clear_task(&mut self) -> bool {
        self.task = None;
        let result = self.store.clear_current_task();
        let cleared = self.record_write(result, "clear current task");
        if !cleared {
            self.engine.post_notice("Couldn't clear task");
        }
        self.emit(&Event::TaskCleared {
            at: chrono::Utc::now(),
        });
        cleared
    }

    /// Report that a keymap binding fired. Returns the event it produced.
    pub fn record_shortcut(&mut self, key: &str, action: &str) -> Event {
        let event = Event::KeyboardShortcut {
            key: key.to_string(),
            action: action.to_string(),
            at: chrono::Utc::now(),
        };
        self.emit(&event);
        event
    }

    pub fn expire_status(&mut self, id: u64) -> bool {
        self.engine.expire_status(id)
    }

    /// Flush durations and session position to the store.
    pub fn shutdown(&mut self) {
        self.save_durations();
        self.save_session();
        debug!(session = self.engine.session_number(), "focus timer shut down");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, events: Vec<Event>) -> Vec<Event> {
        if events
            .iter()
            .any(|e| matches!(e, Event::PhaseCompleted { .. }))
        {
            if self.alerts_enabled {
                if let Err(e) = self.sink.notify_phase_complete() {
                    warn!(error = %e, "phase-complete alert failed");
                }
            }
            self.save_session();
        }
        for event in &events {
            self.emit(event);
        }
        events
    }

    fn emit(&mut self, event: &Event) {
        if !self.analytics_enabled {
            return;
        }
        let attributes = sanitize_attributes(event.attributes());
        if let Err(e) = self.sink.notify_event(event.name(), &attributes) {
            warn!(error = %e, event = event.name(), "analytics event dropped");
        }
    }

    fn record_write(&mut self, result: Result<(), StoreError>, what: &str) -> bool {
        self.last_save_ok = match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to {what}");
                false
            }
        };
        self.last_save_ok
    }

    fn save_durations(&mut self) -> bool {
        let result = self.store.save_durations(self.engine.durations());
        self.record_write(result, "save durations")
    }

    fn save_session(&mut self) -> bool {
        let snapshot = SessionSnapshot {
            session_number: self.engine.session_number(),
            phase: self.engine.phase(),
            saved_at_ms: now_ms(),
        };
        let result = self.store.save_session_snapshot(&snapshot);
        self.record_write(result, "save session")
    }
}
