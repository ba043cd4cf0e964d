use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

/// Inclusive whole-minute bounds for a phase duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteBounds {
    pub min: u32,
    pub max: u32,
}

impl MinuteBounds {
    /// Clamp a requested minute value into the bounds. Never fails.
    pub fn clamp(&self, requested: i64) -> u32 {
        requested.clamp(self.min as i64, self.max as i64) as u32
    }

    pub fn contains(&self, minutes: u32) -> bool {
        (self.min..=self.max).contains(&minutes)
    }
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Work, Phase::ShortBreak, Phase::LongBreak];

    pub fn bounds(self) -> MinuteBounds {
        match self {
            Phase::Work => MinuteBounds { min: 1, max: 90 },
            Phase::ShortBreak => MinuteBounds { min: 1, max: 30 },
            Phase::LongBreak => MinuteBounds { min: 5, max: 60 },
        }
    }

    pub fn default_minutes(self) -> u32 {
        match self {
            Phase::Work => 25,
            Phase::ShortBreak => 5,
            Phase::LongBreak => 15,
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }

    /// Human-readable label shown by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus Time",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Stable identifier used in storage keys and analytics attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short-break",
            Phase::LongBreak => "long-break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(Phase::Work),
            "short-break" | "short_break" | "short" => Ok(Phase::ShortBreak),
            "long-break" | "long_break" | "long" => Ok(Phase::LongBreak),
            other => Err(ConfigError::UnknownPhase(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_asymmetric() {
        assert_eq!(Phase::Work.bounds(), MinuteBounds { min: 1, max: 90 });
        assert_eq!(Phase::ShortBreak.bounds(), MinuteBounds { min: 1, max: 30 });
        assert_eq!(Phase::LongBreak.bounds(), MinuteBounds { min: 5, max: 60 });
    }

    #[test]
    fn clamp_handles_extremes() {
        let b = Phase::LongBreak.bounds();
        assert_eq!(b.clamp(i64::MIN), 5);
        assert_eq!(b.clamp(-3), 5);
        assert_eq!(b.clamp(30), 30);
        assert_eq!(b.clamp(i64::MAX), 60);
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("work".parse::<Phase>().unwrap(), Phase::Work);
        assert_eq!("Short".parse::<Phase>().unwrap(), Phase::ShortBreak);
        assert_eq!("long-break".parse::<Phase>().unwrap(), Phase::LongBreak);
        assert!("nap".parse::<Phase>().is_err());
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&Phase::ShortBreak).unwrap();
        assert_eq!(json, "\"short-break\"");
    }
}
