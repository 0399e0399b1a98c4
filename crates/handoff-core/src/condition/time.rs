//! Time-of-day values used by time-based conditions

use crate::error::{CoreError, Result};
use crate::types::Value;
use chrono::{NaiveTime, Timelike};
use std::fmt;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day at minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(CoreError::ConditionType(format!(
                "time {:02}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self {
            minutes: hour as u16 * 60 + minute as u16,
        })
    }

    /// Parse a `HH:MM` string (a single-digit hour is accepted)
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || CoreError::ConditionType(format!("'{}' is not an HH:MM time", s));

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    /// Parse a condition value that must be an `HH:MM` string
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            other => Err(CoreError::ConditionType(format!(
                "expected an HH:MM string, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16 % MINUTES_PER_DAY,
        }
    }

    pub fn hour(&self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.minutes % 60) as u8
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> u16 {
        self.minutes
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Half-open time window `[start, end)`.
///
/// When `start > end` the window wraps across midnight, so `22:00-06:00`
/// contains 23:30 and 05:59 but not 06:00. A window with `start == end`
/// is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parse a window from `["HH:MM", "HH:MM"]` or `"HH:MM-HH:MM"`
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) if items.len() == 2 => Ok(Self::new(
                TimeOfDay::from_value(&items[0])?,
                TimeOfDay::from_value(&items[1])?,
            )),
            Value::String(s) => {
                let (start, end) = s.split_once('-').ok_or_else(|| {
                    CoreError::ConditionType(format!("'{}' is not an HH:MM-HH:MM window", s))
                })?;
                Ok(Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?))
            }
            other => Err(CoreError::ConditionType(format!(
                "BETWEEN expects [\"HH:MM\", \"HH:MM\"] or \"HH:MM-HH:MM\", got {}",
                other.type_name()
            ))),
        }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        if self.wraps_midnight() {
            time >= self.start || time < self.end
        } else {
            self.start <= time && time < self.end
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
