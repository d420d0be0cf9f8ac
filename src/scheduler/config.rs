// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::types::{ColorScheme, Phase};

/// Names of the settings the scheduler reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettingKeys {
    /// Boolean turning scheduling on and off.
    pub enabled: String,
    /// `HH:MM` start of the day phase.
    pub sunrise: String,
    /// `HH:MM` start of the night phase.
    pub sunset: String,
    /// Interface color-scheme value the scheduler writes.
    pub color_scheme: String,
}

impl Default for SettingKeys {
    fn default() -> Self {
        Self {
            enabled: "enable-theme-timers".to_string(),
            sunrise: "sunrise-time".to_string(),
            sunset: "sunset-time".to_string(),
            color_scheme: "color-scheme".to_string(),
        }
    }
}

/// Configuration for a [`ThemeScheduler`](super::ThemeScheduler).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use duskswitch_lib::scheduler::SchedulerConfig;
/// use duskswitch_lib::types::ColorScheme;
///
/// let config = SchedulerConfig::default()
///     .with_night_scheme(ColorScheme::PreferDark)
///     .with_tick_lead(Duration::from_secs(2));
///
/// let from_json = SchedulerConfig::from_json(r#"{ "tick-lead-secs": 2 }"#).unwrap();
/// assert_eq!(config, from_json);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Setting names.
    pub keys: SettingKeys,
    /// Scheme written during the day phase.
    pub day_scheme: ColorScheme,
    /// Scheme written during the night phase.
    pub night_scheme: ColorScheme,
    /// Seconds past each minute boundary at which polls land.
    pub tick_lead_secs: u64,
    /// Seconds between polls once aligned.
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            keys: SettingKeys::default(),
            day_scheme: ColorScheme::Default,
            night_scheme: ColorScheme::PreferDark,
            tick_lead_secs: 1,
            poll_interval_secs: 60,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a JSON configuration. Missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) for malformed JSON and
    /// [`Error::Config`](crate::Error::Config) if validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the scheduler cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPollInterval`] if the poll interval is zero.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(())
    }

    /// Sets the setting names.
    #[must_use]
    pub fn with_keys(mut self, keys: SettingKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the scheme written during the day.
    #[must_use]
    pub fn with_day_scheme(mut self, scheme: ColorScheme) -> Self {
        self.day_scheme = scheme;
        self
    }

    /// Sets the scheme written during the night.
    #[must_use]
    pub fn with_night_scheme(mut self, scheme: ColorScheme) -> Self {
        self.night_scheme = scheme;
        self
    }

    /// Sets how long after each minute boundary polls land.
    #[must_use]
    pub fn with_tick_lead(mut self, lead: Duration) -> Self {
        self.tick_lead_secs = lead.as_secs();
        self
    }

    /// Sets the interval between aligned polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs();
        self
    }

    /// Returns the tick lead as a duration.
    #[must_use]
    pub fn tick_lead(&self) -> Duration {
        Duration::from_secs(self.tick_lead_secs)
    }

    /// Returns the poll interval as a duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Returns the scheme to apply during `phase`.
    #[must_use]
    pub fn scheme_for(&self, phase: Phase) -> ColorScheme {
        match phase {
            Phase::Day => self.day_scheme,
            Phase::Night => self.night_scheme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_match_desktop_schema() {
        let config = SchedulerConfig::default();
        assert_eq!(config.keys.enabled, "enable-theme-timers");
        assert_eq!(config.keys.color_scheme, "color-scheme");
        assert_eq!(config.scheme_for(Phase::Day), ColorScheme::Default);
        assert_eq!(config.scheme_for(Phase::Night), ColorScheme::PreferDark);
        assert_eq!(config.tick_lead(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn from_json_overrides_nested_keys() {
        let config = SchedulerConfig::from_json(
            r#"{ "keys": { "sunset": "dusk" }, "night-scheme": "prefer-dark", "day-scheme": "prefer-light" }"#,
        )
        .unwrap();

        assert_eq!(config.keys.sunset, "dusk");
        assert_eq!(config.keys.sunrise, "sunrise-time");
        assert_eq!(config.day_scheme, ColorScheme::PreferLight);
    }

    #[test]
    fn from_json_rejects_zero_interval() {
        let result = SchedulerConfig::from_json(r#"{ "poll-interval-secs": 0 }"#);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidPollInterval))
        ));
    }

    #[test]
    fn from_json_rejects_unknown_scheme() {
        let result = SchedulerConfig::from_json(r#"{ "night-scheme": "dark" }"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
