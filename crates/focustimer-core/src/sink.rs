//! Notification sinks: phase-complete alerts and analytics events.
//!
//! Sinks are fire-and-forget from the timer's point of view. Whatever a sink
//! returns, the caller logs it and carries on.

use tracing::{debug, info, warn};

use crate::error::SinkError;
use crate::events::Attributes;

/// Receiver of alerts and analytics events.
pub trait NotificationSink: Send {
    /// Audible and haptic alert when a phase ends.
    fn notify_phase_complete(&mut self) -> Result<(), SinkError>;

    /// Structured analytics event. Attributes are already sanitized.
    fn notify_event(&mut self, name: &str, attributes: &Attributes) -> Result<(), SinkError>;
}

/// Writes alerts and events to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify_phase_complete(&mut self) -> Result<(), SinkError> {
        info!("phase complete");
        Ok(())
    }

    fn notify_event(&mut self, name: &str, attributes: &Attributes) -> Result<(), SinkError> {
        debug!(event = name, ?attributes, "analytics event");
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify_phase_complete(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn notify_event(&mut self, _name: &str, _attributes: &Attributes) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards to several sinks. A failing sink does not stop the others;
/// the first failure is reported once all have been tried.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(
        &mut self,
        mut f: impl FnMut(&mut dyn NotificationSink) -> Result<(), SinkError>,
    ) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = f(sink.as_mut()) {
                warn!(error = %e, "notification sink failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl NotificationSink for FanoutSink {
    fn notify_phase_complete(&mut self) -> Result<(), SinkError> {
        self.each(|s| s.notify_phase_complete())
    }

    fn notify_event(&mut self, name: &str, attributes: &Attributes) -> Result<(), SinkError> {
        self.each(|s| s.notify_event(name, attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Counting {
        calls: Arc<Mutex<usize>>,
        fail: bool,
    }

    impl NotificationSink for Counting {
        fn notify_phase_complete(&mut self) -> Result<(), SinkError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(SinkError::Alert("no audio device".into()));
            }
            Ok(())
        }

        fn notify_event(&mut self, name: &str, _attributes: &Attributes) -> Result<(), SinkError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(SinkError::Delivery {
                    name: name.to_string(),
                    message: "offline".into(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn fanout_keeps_going_after_failure() {
        let failing = Counting {
            fail: true,
            ..Default::default()
        };
        let healthy = Counting::default();
        let mut fanout = FanoutSink::new().with(failing.clone()).with(healthy.clone());
        assert_eq!(fanout.len(), 2);

        assert!(fanout.notify_phase_complete().is_err());
        assert!(fanout.notify_event("timer_start", &Attributes::new()).is_err());
        assert_eq!(*failing.calls.lock().unwrap(), 2);
        assert_eq!(*healthy.calls.lock().unwrap(), 2);
    }

    #[test]
    fn empty_fanout_succeeds() {
        let mut fanout = FanoutSink::new();
        assert!(fanout.is_empty());
        assert!(fanout.notify_phase_complete().is_ok());
    }
}
