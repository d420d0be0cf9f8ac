// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color-scheme values written by the theme scheduler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Desktop color-scheme preference as stored in the interface settings.
///
/// The light variant is [`ColorScheme::Default`] rather than
/// [`ColorScheme::PreferLight`]: `prefer-light` also forces light styling on
/// the shell's own surfaces, `default` does not.
///
/// # Examples
///
/// ```
/// use duskswitch_lib::types::ColorScheme;
///
/// let scheme: ColorScheme = "prefer-dark".parse().unwrap();
/// assert_eq!(scheme, ColorScheme::PreferDark);
/// assert_eq!(scheme.as_str(), "prefer-dark");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    /// No preference (light).
    #[default]
    Default,
    /// Dark preference.
    PreferDark,
    /// Explicit light preference.
    PreferLight,
}

impl ColorScheme {
    /// Returns the settings-store representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PreferDark => "prefer-dark",
            Self::PreferLight => "prefer-light",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "prefer-dark" => Ok(Self::PreferDark),
            "prefer-light" => Ok(Self::PreferLight),
            other => Err(ConfigError::InvalidColorScheme(other.to_string())),
        }
    }
}

/// Which half of the schedule is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Between sunrise (inclusive) and sunset (exclusive).
    Day,
    /// Any other minute of the day.
    Night,
}

impl Phase {
    /// Returns `true` for [`Phase::Day`].
    #[must_use]
    pub const fn is_day(self) -> bool {
        matches!(self, Self::Day)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => f.write_str("day"),
            Self::Night => f.write_str("night"),
        }
    }
}
