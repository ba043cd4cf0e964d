use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Configured nominal duration per phase, in whole seconds.
///
/// Every value is a whole number of minutes inside `Phase::bounds()`;
/// the only way in is through clamping constructors and setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<Phase, u64>", from = "BTreeMap<Phase, u64>")]
pub struct Durations {
    work: u64,
    short_break: u64,
    long_break: u64,
}

impl Durations {
    /// Build from minute values, clamping each into its phase bounds.
    pub fn from_minutes(work: i64, short_break: i64, long_break: i64) -> Self {
        let mut d = Self::default();
        d.set_minutes(Phase::Work, work);
        d.set_minutes(Phase::ShortBreak, short_break);
        d.set_minutes(Phase::LongBreak, long_break);
        d
    }

    /// Build from persisted second values.
    ///
    /// Missing phases fall back to defaults; seconds are rounded to the
    /// nearest minute and clamped.
    pub fn from_seconds_lossy(map: &BTreeMap<Phase, u64>) -> Self {
        let mut d = Self::default();
        for (&phase, &secs) in map {
            let minutes = (secs.saturating_add(30) / 60).min(i64::MAX as u64) as i64;
            d.set_minutes(phase, minutes);
        }
        d
    }

    pub fn get(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        (self.get(phase) / 60) as u32
    }

    /// Clamp `requested` into the phase bounds and store it.
    /// Returns the minutes actually applied.
    pub fn set_minutes(&mut self, phase: Phase, requested: i64) -> u32 {
        let minutes = phase.bounds().clamp(requested);
        let secs = u64::from(minutes) * 60;
        match phase {
            Phase::Work => self.work = secs,
            Phase::ShortBreak => self.short_break = secs,
            Phase::LongBreak => self.long_break = secs,
        }
        minutes
    }

    pub fn to_map(&self) -> BTreeMap<Phase, u64> {
        Phase::ALL.iter().map(|&p| (p, self.get(p))).collect()
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work: u64::from(Phase::Work.default_minutes()) * 60,
            short_break: u64::from(Phase::ShortBreak.default_minutes()) * 60,
            long_break: u64::from(Phase::LongBreak.default_minutes()) * 60,
        }
    }
}

impl From<Durations> for BTreeMap<Phase, u64> {
    fn from(d: Durations) -> Self {
        d.to_map()
    }
}

impl From<BTreeMap<Phase, u64>> for Durations {
    fn from(map: BTreeMap<Phase, u64>) -> Self {
        Self::from_seconds_lossy(&map)
    }
}
