// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Working state of a theme scheduler.

use super::decision::{Checkpoint, DayWindow};
use crate::error::ConfigError;
use crate::host::TimerHandle;
use crate::types::TimeOfDay;

/// Whether the scheduler's poll timers are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulePhase {
    /// No timer armed.
    #[default]
    Stopped,
    /// Alignment or recurring timer armed.
    Watching,
}

/// Mutable state owned by one scheduler.
///
/// Only the scheduler's own handlers touch it. Timer handles in particular
/// are never cancelled by anyone else.
#[derive(Debug, Clone)]
pub(crate) struct ScheduleState {
    /// Listeners are registered.
    pub(crate) attached: bool,
    pub(crate) enabled: bool,
    /// Last read of the sunrise setting.
    pub(crate) sunrise: Result<TimeOfDay, ConfigError>,
    /// Last read of the sunset setting.
    pub(crate) sunset: Result<TimeOfDay, ConfigError>,
    pub(crate) manually_overridden: bool,
    /// An evaluation is in flight.
    pub(crate) applying: bool,
    pub(crate) phase: SchedulePhase,
    pub(crate) alignment: Option<TimerHandle>,
    pub(crate) recurring: Option<TimerHandle>,
    /// Bumped on every start and stop so callbacks from an earlier watch
    /// can tell they are stale.
    pub(crate) generation: u64,
    /// Last successful evaluation in this watch.
    pub(crate) last_evaluated: Option<Checkpoint>,
}

impl ScheduleState {
    /// The window built from the cached time settings.
    pub(crate) fn window(&self) -> Result<DayWindow, ConfigError> {
        let sunrise = self.sunrise.clone()?;
        let sunset = self.sunset.clone()?;
        DayWindow::new(sunrise, sunset)
    }

    /// Clears both timer handles, returning whichever were set.
    pub(crate) fn take_timers(&mut self) -> [Option<TimerHandle>; 2] {
        [self.alignment.take(), self.recurring.take()]
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        let unset = || Err(ConfigError::InvalidTimeOfDay(String::new()));
        Self {
            attached: false,
            enabled: false,
            sunrise: unset(),
            sunset: unset(),
            manually_overridden: false,
            applying: false,
            phase: SchedulePhase::Stopped,
            alignment: None,
            recurring: None,
            generation: 0,
            last_evaluated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_requires_both_times() {
        let mut state = ScheduleState {
            sunrise: "07:00".parse(),
            ..ScheduleState::default()
        };
        assert!(state.window().is_err());

        state.sunset = "19:00".parse();
        assert!(state.window().is_ok());

        state.sunrise = "25:99".parse();
        assert_eq!(
            state.window(),
            Err(ConfigError::InvalidTimeOfDay("25:99".to_string()))
        );
    }

    #[test]
    fn take_timers_clears_handles() {
        let mut state = ScheduleState {
            alignment: Some(TimerHandle::new(1)),
            ..ScheduleState::default()
        };
        assert_eq!(state.take_timers(), [Some(TimerHandle::new(1)), None]);
        assert_eq!(state.take_timers(), [None, None]);
    }
}
