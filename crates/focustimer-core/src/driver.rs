//! Real-time tick cadence for a [`FocusTimer`].
//!
//! The driver owns the timer behind a `tokio` mutex and keeps at most one
//! ticker task alive, only while the timer is running. Every command goes
//! through [`TimerDriver::execute`], which applies it and then re-syncs the
//! ticker and the status-message expiry to the new state.
//!
//! Background tasks hold only a weak reference and a generation number, so
//! a tick that wakes up after a pause, restart, or teardown finds nothing to
//! mutate and exits.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::events::Event;
use crate::focus::FocusTimer;
use crate::input::Command;
use crate::timer::{now_ms, TimerSnapshot};

/// Real-time length of one engine tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

struct Inner {
    timer: FocusTimer,
    tick_period: Duration,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    expiry: Option<(u64, JoinHandle<()>)>,
    closed: bool,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            self.generation += 1;
            handle.abort();
        }
    }

    fn stop_expiry(&mut self) {
        if let Some((_, handle)) = self.expiry.take() {
            handle.abort();
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.timer.snapshot());
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_ticker();
        self.stop_expiry();
    }
}

pub struct TimerDriver {
    inner: Arc<Mutex<Inner>>,
    snapshots: watch::Receiver<TimerSnapshot>,
}

impl TimerDriver {
    pub fn new(timer: FocusTimer) -> Self {
        Self::with_tick_period(timer, TICK_PERIOD)
    }

    pub fn with_tick_period(timer: FocusTimer, tick_period: Duration) -> Self {
        let (tx, rx) = watch::channel(timer.snapshot());
        let inner = Inner {
            timer,
            tick_period,
            generation: 0,
            ticker: None,
            expiry: None,
            closed: false,
            snapshots: tx,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            snapshots: rx,
        }
    }

    /// Receive a fresh snapshot after every tick and command.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.inner.lock().await.timer.snapshot()
    }

    pub async fn task(&self) -> Option<String> {
        self.inner.lock().await.timer.task().map(str::to_string)
    }

    /// Apply a command and re-sync background tasks. Ignored after shutdown.
    pub async fn execute(&self, command: Command) -> Vec<Event> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            debug!(command = command.name(), "command after shutdown ignored");
            return Vec::new();
        }
        let restart = command.restarts_clock();
        let events = command.apply(&mut inner.timer);
        if restart {
            // A fresh countdown gets its first tick a full period from now.
            inner.stop_ticker();
        }
        sync(&Arc::downgrade(&self.inner), &mut inner);
        events
    }

    /// Cancel all pending callbacks and flush persistence. Idempotent.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.closed = true;
        inner.stop_ticker();
        inner.stop_expiry();
        inner.timer.shutdown();
        inner.publish();
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

/// Bring the ticker and status expiry in line with the timer, then publish.
fn sync(weak: &Weak<Mutex<Inner>>, inner: &mut Inner) {
    if inner.timer.is_running() {
        if inner.ticker.is_none() {
            inner.generation += 1;
            let handle = spawn_ticker(weak.clone(), inner.generation, inner.tick_period);
            inner.ticker = Some(handle);
        }
    } else {
        inner.stop_ticker();
    }

    let status = inner.timer.status().map(|m| (m.id, m.expires_at_ms));
    match status {
        Some((id, _)) if inner.expiry.as_ref().is_some_and(|(cur, _)| *cur == id) => {}
        Some((id, expires_at_ms)) => {
            inner.stop_expiry();
            let delay = Duration::from_millis(expires_at_ms.saturating_sub(now_ms()));
            inner.expiry = Some((id, spawn_expiry(weak.clone(), id, delay)));
        }
        None => inner.stop_expiry(),
    }

    inner.publish();
}

fn spawn_ticker(weak: Weak<Mutex<Inner>>, generation: u64, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            let mut inner = shared.lock().await;
            if inner.closed || inner.generation != generation {
                break;
            }
            inner.timer.tick();
            if !inner.timer.is_running() {
                // Completion stopped the clock; this task is the ticker being retired.
                inner.ticker = None;
                inner.generation += 1;
                sync(&weak, &mut inner);
                break;
            }
            inner.publish();
        }
    })
}

fn spawn_expiry(weak: Weak<Mutex<Inner>>, id: u64, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(delay).await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut inner = shared.lock().await;
        if inner.closed {
            return;
        }
        if inner.timer.expire_status(id) {
            inner.expiry = None;
            inner.publish();
        }
    })
}
