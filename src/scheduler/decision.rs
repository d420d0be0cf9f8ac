// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pure day/night decision functions.

use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{MINUTES_PER_DAY, Phase, TimeOfDay, WallTime};

/// Seconds in one day.
const SECONDS_PER_DAY: i64 = 86_400;

/// Where the clock stood when the schedule was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Local minute of day.
    pub minute: u16,
    /// Absolute time in seconds, see [`Clock::timestamp`](crate::host::Clock::timestamp).
    pub timestamp: i64,
}

impl Checkpoint {
    /// Creates a checkpoint.
    #[must_use]
    pub fn new(minute: u16, timestamp: i64) -> Self {
        Self { minute, timestamp }
    }
}

/// The day phase of a schedule: `[sunrise, sunset)`.
///
/// Only windows where sunset comes strictly after sunrise on the same day are
/// supported. An inverted schedule (night shift, sunset before sunrise) is
/// rejected rather than evaluated with a formula that cannot express it.
///
/// # Examples
///
/// ```
/// use duskswitch_lib::scheduler::DayWindow;
/// use duskswitch_lib::types::Phase;
///
/// let window = DayWindow::new("07:00".parse()?, "19:00".parse()?)?;
///
/// assert_eq!(window.phase_at(6 * 60 + 59), Phase::Night);
/// assert_eq!(window.phase_at(7 * 60), Phase::Day);
/// assert_eq!(window.phase_at(19 * 60), Phase::Night);
/// # Ok::<(), duskswitch_lib::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    sunrise: TimeOfDay,
    sunset: TimeOfDay,
}

impl DayWindow {
    /// Creates a window from sunrise to sunset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedWindow`] if `sunset <= sunrise`.
    pub fn new(sunrise: TimeOfDay, sunset: TimeOfDay) -> Result<Self, ConfigError> {
        if sunset <= sunrise {
            return Err(ConfigError::InvertedWindow {
                sunrise: sunrise.to_string(),
                sunset: sunset.to_string(),
            });
        }
        Ok(Self { sunrise, sunset })
    }

    /// Returns the sunrise time.
    #[must_use]
    pub fn sunrise(&self) -> TimeOfDay {
        self.sunrise
    }

    /// Returns the sunset time.
    #[must_use]
    pub fn sunset(&self) -> TimeOfDay {
        self.sunset
    }

    /// Returns `true` if `now_minutes` falls in `[sunrise, sunset)`.
    #[must_use]
    pub fn is_day(&self, now_minutes: u16) -> bool {
        self.sunrise.minutes() <= now_minutes && now_minutes < self.sunset.minutes()
    }

    /// Returns the active phase at `now_minutes`.
    #[must_use]
    pub fn phase_at(&self, now_minutes: u16) -> Phase {
        if self.is_day(now_minutes) {
            Phase::Day
        } else {
            Phase::Night
        }
    }

    /// Returns `true` if sunrise or sunset was passed between `previous` and
    /// `now`, that is, lies in the local minute interval `(previous, now]`.
    ///
    /// `previous` is the last successful evaluation. Without one, the minute
    /// before `now` is used. The timestamps decide how the local minutes are
    /// read:
    ///
    /// - a timestamp that went back means the clock was set back, which
    ///   crosses nothing;
    /// - `now` earlier in the day than `previous` is a trip past midnight only
    ///   if enough time passed for it, otherwise local time was set back (a
    ///   daylight saving change) and nothing is crossed;
    /// - a full day or more always crosses.
    #[must_use]
    pub fn crossed_boundary(&self, previous: Option<Checkpoint>, now: Checkpoint) -> bool {
        let Some(previous) = previous else {
            let before = (now.minute + MINUTES_PER_DAY - 1) % MINUTES_PER_DAY;
            return self.crossed_between(before, now.minute);
        };

        let elapsed = now.timestamp.saturating_sub(previous.timestamp);
        if elapsed < 0 {
            return false;
        }
        if elapsed >= SECONDS_PER_DAY {
            return true;
        }
        if previous.minute > now.minute {
            let wrapped = i64::from(now.minute + MINUTES_PER_DAY - previous.minute);
            // One minute of slack for the seconds within each reading.
            if (wrapped - 1) * 60 > elapsed {
                return false;
            }
        }
        self.crossed_between(previous.minute, now.minute)
    }

    fn crossed_between(&self, previous: u16, now: u16) -> bool {
        crossed(self.sunrise.minutes(), previous, now)
            || crossed(self.sunset.minutes(), previous, now)
    }
}

/// Returns `true` if `boundary` lies in the half-open minute interval
/// `(previous, now]`, wrapping past midnight when `now < previous`.
fn crossed(boundary: u16, previous: u16, now: u16) -> bool {
    match previous.cmp(&now) {
        std::cmp::Ordering::Equal => false,
        std::cmp::Ordering::Less => previous < boundary && boundary <= now,
        std::cmp::Ordering::Greater => boundary > previous || boundary <= now,
    }
}

/// Delay until `lead` past the next whole minute: `60 - second + lead`.
#[must_use]
pub fn alignment_delay(now: WallTime, lead: Duration) -> Duration {
    Duration::from_secs(60 - u64::from(now.second.min(59))) + lead
}
