// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-of-day types for the theme scheduler.
//!
//! # Types
//!
//! - [`TimeOfDay`] - A minute of the day parsed from an `HH:MM` setting
//! - [`WallTime`] - A wall-clock reading (hour, minute, second) from a host clock

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;

use crate::error::ConfigError;

/// Number of minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

// =============================================================================
// TimeOfDay
// =============================================================================

/// A minute of the day in the range `0..=1439`.
///
/// Parsed strictly from `HH:MM`: exactly two digits for the hour (`00`-`23`),
/// a colon, and exactly two digits for the minute (`00`-`59`).
///
/// # Examples
///
/// ```
/// use duskswitch_lib::types::TimeOfDay;
///
/// let sunrise: TimeOfDay = "07:00".parse().unwrap();
/// assert_eq!(sunrise.minutes(), 420);
/// assert_eq!(sunrise.to_string(), "07:00");
///
/// assert!("25:99".parse::<TimeOfDay>().is_err());
/// assert!("7:00".parse::<TimeOfDay>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight (`00:00`).
    pub const MIDNIGHT: Self = Self(0);

    /// Creates a time of day from an hour and a minute.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeOfDay`] if the hour is above 23 or the
    /// minute above 59.
    pub fn from_hm(hour: u8, minute: u8) -> Result<Self, ConfigError> {
        if hour > 23 || minute > 59 {
            return Err(ConfigError::InvalidTimeOfDay(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    /// Creates a time of day from minutes since midnight.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeOfDay`] if `minutes` is 1440 or more.
    pub fn from_minutes(minutes: u16) -> Result<Self, ConfigError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(ConfigError::InvalidTimeOfDay(format!("{minutes} minutes")));
        }
        Ok(Self(minutes))
    }

    /// Returns the number of minutes since midnight.
    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Returns the hour component (0-23).
    #[must_use]
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Returns the minute component (0-59).
    #[must_use]
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidTimeOfDay(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour = parse_two_digits(hour).ok_or_else(invalid)?;
        let minute = parse_two_digits(minute).ok_or_else(invalid)?;

        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

/// Parses exactly two ASCII digits.
fn parse_two_digits(s: &str) -> Option<u8> {
    match s.as_bytes() {
        [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => Some((tens - b'0') * 10 + (ones - b'0')),
        _ => None,
    }
}

// =============================================================================
// WallTime
// =============================================================================

/// A wall-clock reading as reported by a host [`Clock`](crate::host::Clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Hour of the day (0-23).
    pub hour: u8,
    /// Minute of the hour (0-59).
    pub minute: u8,
    /// Second of the minute (0-59).
    pub second: u8,
}

impl WallTime {
    /// Creates a wall-clock reading.
    ///
    /// Components overflowing their range wrap into the next unit, so
    /// `WallTime::new(23, 59, 60)` reads as midnight.
    #[must_use]
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self::from_seconds_of_day(
            u32::from(hour) * 3600 + u32::from(minute) * 60 + u32::from(second),
        )
    }

    /// Creates a wall-clock reading from seconds since midnight, wrapping at 24h.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_seconds_of_day(seconds: u32) -> Self {
        let seconds = seconds % 86_400;
        Self {
            hour: (seconds / 3600) as u8,
            minute: (seconds / 60 % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Returns the number of seconds since midnight.
    #[must_use]
    pub fn seconds_of_day(self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }

    /// Returns `hour * 60 + minute`.
    #[must_use]
    pub fn minutes_of_day(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl<T: Timelike> From<&T> for WallTime {
    #[allow(clippy::cast_possible_truncation)]
    fn from(time: &T) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            // Leap seconds report as 60; clamp them onto the last second.
            second: time.second().min(59) as u8,
        }
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!("00:00".parse::<TimeOfDay>().unwrap().minutes(), 0);
        assert_eq!("07:00".parse::<TimeOfDay>().unwrap().minutes(), 420);
        assert_eq!("19:30".parse::<TimeOfDay>().unwrap().minutes(), 1170);
        assert_eq!("23:59".parse::<TimeOfDay>().unwrap().minutes(), 1439);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!("25:99".parse::<TimeOfDay>().is_err());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn parse_rejects_malformed() {
        for input in ["", "7:00", "07:0", "0700", "07-00", "07:00:00", "ab:cd", " 07:00", "+7:00"] {
            assert!(input.parse::<TimeOfDay>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn parse_error_keeps_input() {
        let err = "25:99".parse::<TimeOfDay>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeOfDay(ref s) if s == "25:99"));
    }

    #[test]
    fn display_pads_components() {
        let time = TimeOfDay::from_hm(7, 5).unwrap();
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn from_minutes_bounds() {
        assert!(TimeOfDay::from_minutes(1439).is_ok());
        assert!(TimeOfDay::from_minutes(1440).is_err());
    }

    #[test]
    fn wall_time_wraps() {
        let time = WallTime::new(23, 59, 60);
        assert_eq!(time, WallTime::new(0, 0, 0));
        assert_eq!(WallTime::new(18, 59, 30).minutes_of_day(), 1139);
    }

    #[test]
    fn wall_time_from_chrono() {
        let naive = chrono::NaiveTime::from_hms_opt(6, 59, 1).unwrap();
        let time = WallTime::from(&naive);
        assert_eq!(time, WallTime::new(6, 59, 1));
        assert_eq!(time.to_string(), "06:59:01");
    }
}
