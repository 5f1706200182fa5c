//! Day/night polling cadence
//!
//! The cadence policy answers two questions for a given wall-clock time:
//! which cadence is in effect, and whether that minute is a poll slot.
//! Poll slots are aligned to midnight so polls land on readable times
//! (05:00, 05:10, ... by day; 22:00, 00:00, 02:00, ... by night).

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ScheduleConfig;
use crate::utils::error::SchedulerError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Active polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadence {
    /// Short interval during the day window
    Day,
    /// Long interval outside the day window
    Night,
}

impl Cadence {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time-of-day polling policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadencePolicy {
    day_start: NaiveTime,
    night_start: NaiveTime,
    day_interval_minutes: u32,
    night_interval_minutes: u32,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN),
            night_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            day_interval_minutes: 10,
            night_interval_minutes: 120,
        }
    }
}

impl CadencePolicy {
    /// Create a policy from window bounds and intervals
    pub fn new(
        day_start: NaiveTime,
        night_start: NaiveTime,
        day_interval_minutes: u32,
        night_interval_minutes: u32,
    ) -> Result<Self, SchedulerError> {
        validate_interval("day_interval_minutes", day_interval_minutes)?;
        validate_interval("night_interval_minutes", night_interval_minutes)?;

        if day_start == night_start {
            return Err(SchedulerError::EmptyWindow(
                day_start.format("%H:%M").to_string(),
            ));
        }

        Ok(Self {
            day_start,
            night_start,
            day_interval_minutes,
            night_interval_minutes,
        })
    }

    /// Build from the `[schedule]` config section
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, SchedulerError> {
        Self::new(
            parse_hhmm("day_start", &config.day_start)?,
            parse_hhmm("night_start", &config.night_start)?,
            config.day_interval_minutes,
            config.night_interval_minutes,
        )
    }

    /// Cadence in effect at the given local time
    pub fn cadence_at(&self, time: NaiveTime) -> Cadence {
        let in_day = if self.day_start < self.night_start {
            time >= self.day_start && time < self.night_start
        } else {
            // day window wraps past midnight
            time >= self.day_start || time < self.night_start
        };

        if in_day {
            Cadence::Day
        } else {
            Cadence::Night
        }
    }

    /// Poll interval for a cadence, in minutes
    pub fn interval_minutes(&self, cadence: Cadence) -> u32 {
        match cadence {
            Cadence::Day => self.day_interval_minutes,
            Cadence::Night => self.night_interval_minutes,
        }
    }

    /// Poll interval for a cadence
    pub fn interval(&self, cadence: Cadence) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes(cadence)) * 60)
    }

    /// Whether `now` falls on a poll slot of the cadence active at `now`
    pub fn is_poll_slot(&self, now: NaiveDateTime) -> bool {
        let cadence = self.cadence_at(now.time());
        let minute_of_day = now.hour() * 60 + now.minute();
        minute_of_day % self.interval_minutes(cadence) == 0
    }
}

fn validate_interval(field: &str, minutes: u32) -> Result<(), SchedulerError> {
    if minutes == 0 || minutes > MINUTES_PER_DAY {
        return Err(SchedulerError::InvalidInterval {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, SchedulerError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| SchedulerError::InvalidTime {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_cadence_by_time_of_day() {
        let policy = CadencePolicy::default();

        assert_eq!(policy.cadence_at(at(23, 0).time()), Cadence::Night);
        assert_eq!(policy.cadence_at(at(9, 0).time()), Cadence::Day);
        assert_eq!(policy.cadence_at(at(4, 59).time()), Cadence::Night);
        assert_eq!(policy.cadence_at(at(5, 0).time()), Cadence::Day);
        assert_eq!(policy.cadence_at(at(21, 59).time()), Cadence::Day);
        assert_eq!(policy.cadence_at(at(22, 0).time()), Cadence::Night);
    }

    #[test]
    fn test_intervals() {
        let policy = CadencePolicy::default();
        assert_eq!(policy.interval(Cadence::Day), Duration::from_secs(600));
        assert_eq!(policy.interval(Cadence::Night), Duration::from_secs(7200));
    }

    #[test]
    fn test_day_poll_slots() {
        let policy = CadencePolicy::default();
        assert!(policy.is_poll_slot(at(9, 0)));
        assert!(policy.is_poll_slot(at(9, 10)));
        assert!(!policy.is_poll_slot(at(9, 5)));
        assert!(policy.is_poll_slot(at(5, 0)));
    }

    #[test]
    fn test_night_poll_slots() {
        let policy = CadencePolicy::default();
        assert!(policy.is_poll_slot(at(22, 0)));
        assert!(policy.is_poll_slot(at(0, 0)));
        assert!(policy.is_poll_slot(at(2, 0)));
        assert!(!policy.is_poll_slot(at(23, 0)));
        assert!(!policy.is_poll_slot(at(22, 10)));
        assert!(!policy.is_poll_slot(at(4, 50)));
    }

    #[test]
    fn test_wrapping_day_window() {
        let policy = CadencePolicy::new(
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
            10,
            120,
        )
        .unwrap();

        assert_eq!(policy.cadence_at(at(23, 0).time()), Cadence::Day);
        assert_eq!(policy.cadence_at(at(3, 59).time()), Cadence::Day);
        assert_eq!(policy.cadence_at(at(12, 0).time()), Cadence::Night);
    }

    #[test]
    fn test_invalid_policies() {
        let five = NaiveTime::from_hms_opt(5, 0, 0).unwrap();
        assert!(matches!(
            CadencePolicy::new(five, five, 10, 120),
            Err(SchedulerError::EmptyWindow(_))
        ));

        let config = ScheduleConfig {
            day_start: "5am".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            CadencePolicy::from_config(&config),
            Err(SchedulerError::InvalidTime { .. })
        ));

        let config = ScheduleConfig {
            day_interval_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(
            CadencePolicy::from_config(&config),
            Err(SchedulerError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_from_default_config_matches_default_policy() {
        let policy = CadencePolicy::from_config(&ScheduleConfig::default()).unwrap();
        assert_eq!(policy, CadencePolicy::default());
    }
}
