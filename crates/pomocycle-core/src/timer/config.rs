//! Immutable timer configuration.
//!
//! A [`Configuration`] is validated once at construction and is `Copy`
//! afterwards; the engine never re-checks it. Deserialization runs the same
//! validation, so a settings file cannot smuggle in a negative duration or a
//! zero cadence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::error::ConfigError;

const SECOND_MS: u64 = 1000;
const MINUTE_MS: u64 = 60 * SECOND_MS;

/// Durations for each phase plus the long-break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration")]
pub struct Configuration {
    work_duration_ms: u64,
    short_break_duration_ms: u64,
    long_break_duration_ms: u64,
    long_break_every: u32,
}

/// Unvalidated wire form, signed so negative input is caught and reported.
#[derive(Debug, Deserialize)]
struct RawConfiguration {
    work_duration_ms: i64,
    short_break_duration_ms: i64,
    long_break_duration_ms: i64,
    #[serde(default = "default_long_break_every")]
    long_break_every: i64,
}

fn default_long_break_every() -> i64 {
    4
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        Configuration::from_signed_millis(
            raw.work_duration_ms,
            raw.short_break_duration_ms,
            raw.long_break_duration_ms,
            raw.long_break_every,
        )
    }
}

impl Configuration {
    /// Build a configuration from millisecond durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCadence`] if `long_break_every` is 0.
    pub fn new(
        work_duration_ms: u64,
        short_break_duration_ms: u64,
        long_break_duration_ms: u64,
        long_break_every: u32,
    ) -> Result<Self, ConfigError> {
        if long_break_every == 0 {
            return Err(ConfigError::ZeroCadence(0));
        }
        Ok(Self {
            work_duration_ms,
            short_break_duration_ms,
            long_break_duration_ms,
            long_break_every,
        })
    }

    /// Build a configuration from signed input, failing fast on anything
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NegativeDuration`] for the first negative
    /// duration, or [`ConfigError::ZeroCadence`] if the cadence is below 1.
    pub fn from_signed_millis(
        work_duration_ms: i64,
        short_break_duration_ms: i64,
        long_break_duration_ms: i64,
        long_break_every: i64,
    ) -> Result<Self, ConfigError> {
        let non_negative = |phase: Phase, value: i64| {
            u64::try_from(value).map_err(|_| ConfigError::NegativeDuration { phase, value })
        };
        let work = non_negative(Phase::Work, work_duration_ms)?;
        let short = non_negative(Phase::ShortBreak, short_break_duration_ms)?;
        let long = non_negative(Phase::LongBreak, long_break_duration_ms)?;
        let every = u32::try_from(long_break_every)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ConfigError::ZeroCadence(long_break_every))?;
        Self::new(work, short, long, every)
    }

    /// Build a configuration from whole seconds.
    ///
    /// Uses saturating arithmetic so absurdly large inputs clamp instead of
    /// overflowing.
    pub fn from_secs(
        work_secs: u64,
        short_break_secs: u64,
        long_break_secs: u64,
        long_break_every: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(
            work_secs.saturating_mul(SECOND_MS),
            short_break_secs.saturating_mul(SECOND_MS),
            long_break_secs.saturating_mul(SECOND_MS),
            long_break_every,
        )
    }

    pub fn work_duration_ms(&self) -> u64 {
        self.work_duration_ms
    }

    pub fn short_break_duration_ms(&self) -> u64 {
        self.short_break_duration_ms
    }

    pub fn long_break_duration_ms(&self) -> u64 {
        self.long_break_duration_ms
    }

    pub fn long_break_every(&self) -> u32 {
        self.long_break_every
    }

    /// Configured duration of `phase` in milliseconds.
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_duration_ms,
            Phase::ShortBreak => self.short_break_duration_ms,
            Phase::LongBreak => self.long_break_duration_ms,
        }
    }

    /// Copy of this configuration with different phase durations.
    pub fn with_durations(
        self,
        work_duration_ms: u64,
        short_break_duration_ms: u64,
        long_break_duration_ms: u64,
    ) -> Self {
        Self {
            work_duration_ms,
            short_break_duration_ms,
            long_break_duration_ms,
            ..self
        }
    }

    /// Copy of this configuration with a different cadence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCadence`] if `long_break_every` is 0.
    pub fn with_long_break_every(self, long_break_every: u32) -> Result<Self, ConfigError> {
        Self::new(
            self.work_duration_ms,
            self.short_break_duration_ms,
            self.long_break_duration_ms,
            long_break_every,
        )
    }

    /// True when every phase has zero length.
    pub fn is_all_zero(&self) -> bool {
        Phase::ALL.iter().all(|p| self.duration_for(*p) == 0)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Preset::Classic.configuration()
    }
}

/// Quick-pick duration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 25 min work, 5 min short break, 15 min long break.
    Classic,
    /// 50 min work, 10 min short break, 30 min long break.
    Extended,
}

impl Preset {
    pub fn configuration(self) -> Configuration {
        let (work, short, long) = match self {
            Preset::Classic => (25, 5, 15),
            Preset::Extended => (50, 10, 30),
        };
        Configuration {
            work_duration_ms: work * MINUTE_MS,
            short_break_duration_ms: short * MINUTE_MS,
            long_break_duration_ms: long * MINUTE_MS,
            long_break_every: 4,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Classic => f.write_str("classic"),
            Preset::Extended => f.write_str("extended"),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "25-5" | "25_5" => Ok(Preset::Classic),
            "extended" | "50-10" | "50_10" => Ok(Preset::Extended),
            other => Err(format!("unknown preset: {other} (expected classic or extended)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_classic_pomodoro() {
        let cfg = Configuration::default();
        assert_eq!(cfg.work_duration_ms(), 25 * 60 * 1000);
        assert_eq!(cfg.short_break_duration_ms(), 5 * 60 * 1000);
        assert_eq!(cfg.long_break_duration_ms(), 15 * 60 * 1000);
        assert_eq!(cfg.long_break_every(), 4);
    }

    #[test]
    fn zero_cadence_is_rejected() {
        assert_eq!(
            Configuration::new(1, 1, 1, 0),
            Err(ConfigError::ZeroCadence(0))
        );
        assert_eq!(
            Configuration::from_signed_millis(1, 1, 1, -3),
            Err(ConfigError::ZeroCadence(-3))
        );
    }

    #[test]
    fn negative_duration_fails_fast() {
        let err = Configuration::from_signed_millis(25_000, -1, 15_000, 4).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeDuration {
                phase: Phase::ShortBreak,
                value: -1
            }
        );
    }

    #[test]
    fn zero_durations_are_allowed() {
        let cfg = Configuration::from_signed_millis(0, 0, 0, 1).unwrap();
        assert!(cfg.is_all_zero());
    }

    #[test]
    fn duration_for_maps_each_phase() {
        let cfg = Configuration::new(25_000, 5_000, 15_000, 4).unwrap();
        assert_eq!(cfg.duration_for(Phase::Work), 25_000);
        assert_eq!(cfg.duration_for(Phase::ShortBreak), 5_000);
        assert_eq!(cfg.duration_for(Phase::LongBreak), 15_000);
    }

    #[test]
    fn from_secs_saturates() {
        let cfg = Configuration::from_secs(u64::MAX, 1, 90, 4).unwrap();
        assert_eq!(cfg.work_duration_ms(), u64::MAX);
        assert_eq!(cfg.short_break_duration_ms(), 1_000);
        assert_eq!(cfg.long_break_duration_ms(), 90_000);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Configuration = serde_json::from_str(
            r#"{"work_duration_ms":1000,"short_break_duration_ms":500,"long_break_duration_ms":700}"#,
        )
        .unwrap();
        assert_eq!(ok.long_break_every(), 4);

        let negative = serde_json::from_str::<Configuration>(
            r#"{"work_duration_ms":-1,"short_break_duration_ms":500,"long_break_duration_ms":700}"#,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn extended_preset_durations() {
        let cfg = Preset::Extended.configuration();
        assert_eq!(cfg.work_duration_ms(), 50 * 60 * 1000);
        assert_eq!(cfg.short_break_duration_ms(), 10 * 60 * 1000);
        assert_eq!(cfg.long_break_duration_ms(), 30 * 60 * 1000);
    }

    #[test]
    fn preset_parses_chip_names() {
        assert_eq!("25-5".parse::<Preset>().unwrap(), Preset::Classic);
        assert_eq!("Extended".parse::<Preset>().unwrap(), Preset::Extended);
        assert!("custom".parse::<Preset>().is_err());
    }
}
