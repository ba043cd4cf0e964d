//! In-process settings store for tests and throwaway runs.

use super::{PersistenceStore, SessionSnapshot};
use crate::error::StoreError;
use crate::timer::Durations;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    durations: Option<Durations>,
    current_task: Option<String>,
    session: Option<SessionSnapshot>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a full or locked store.
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    pub fn with_durations(mut self, durations: Durations) -> Self {
        self.durations = Some(durations);
        self
    }

    pub fn with_session(mut self, snapshot: SessionSnapshot) -> Self {
        self.session = Some(snapshot);
        self
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn check_writable(&mut self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl PersistenceStore for MemoryStore {
    fn load_durations(&mut self) -> Result<Option<Durations>, StoreError> {
        Ok(self.durations)
    }

    fn save_durations(&mut self, durations: &Durations) -> Result<(), StoreError> {
        self.check_writable()?;
        self.durations = Some(*durations);
        Ok(())
    }

    fn load_current_task(&mut self) -> Result<Option<String>, StoreError> {
        Ok(self.current_task.clone())
    }

    fn save_current_task(&mut self, text: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.current_task = Some(text.to_string());
        Ok(())
    }

    fn clear_current_task(&mut self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.current_task = None;
        Ok(())
    }

    fn load_session_snapshot(&mut self) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(self.session)
    }

    fn save_session_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        self.check_writable()?;
        self.session = Some(*snapshot);
        Ok(())
    }

    fn clear_session_snapshot(&mut self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.session = None;
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.durations = None;
        self.current_task = None;
        self.session = None;
        Ok(())
    }
}
