// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `DuskSwitch` library.
//!
//! This module provides the error hierarchy for the library: signal
//! registration against observable sources, settings store access, and
//! configuration validation.
//!
//! The three families follow different propagation rules:
//!
//! - [`SignalError`] raised while *registering* a listener is returned to the
//!   caller. Raised while *disconnecting*, it is swallowed by the registry.
//! - [`SettingsError`] and [`ConfigError`] met during a scheduler tick are
//!   logged and the tick is skipped, never propagated out of a timer.

use thiserror::Error;

use crate::subscription::HandlerId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// An observable source rejected a registration.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    /// The settings store rejected a read or write.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A configuration value is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON input could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required host service was not provided to a builder.
    #[error("missing host service: {0}")]
    MissingService(&'static str),
}

/// Errors raised by observable sources when connecting or disconnecting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The source does not emit the requested signal.
    #[error("unknown signal: {0}")]
    UnknownSignal(String),

    /// The handler id is not registered on this source.
    #[error("unknown handler: {0}")]
    UnknownHandler(HandlerId),

    /// The source no longer accepts registrations.
    #[error("source is closed")]
    Closed,

    /// The source refused the registration for another reason.
    #[error("registration rejected: {0}")]
    Rejected(String),
}

/// Errors raised by a settings store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The key is not part of the store's schema.
    #[error("unknown setting key: {0}")]
    UnknownKey(String),

    /// The key exists but holds a value of another type.
    #[error("setting {key} is not a {expected}")]
    TypeMismatch {
        /// The key that was accessed.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
    },
}

/// Errors related to configuration values.
///
/// These are the reasons a scheduler tick is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A time-of-day string is not a valid `HH:MM` value.
    #[error("invalid time of day: '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),

    /// Sunset does not come after sunrise within the same day.
    #[error("unsupported schedule: sunset {sunset} is not after sunrise {sunrise}")]
    InvertedWindow {
        /// Configured sunrise, formatted as `HH:MM`.
        sunrise: String,
        /// Configured sunset, formatted as `HH:MM`.
        sunset: String,
    },

    /// A color-scheme string is not recognized.
    #[error("invalid color scheme: {0}")]
    InvalidColorScheme(String),

    /// The poll interval must be at least one second.
    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,

    /// A setting the schedule depends on could not be read or written.
    #[error("settings store error: {0}")]
    Store(#[from] SettingsError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidTimeOfDay("25:99".to_string());
        assert_eq!(
            err.to_string(),
            "invalid time of day: '25:99' (expected HH:MM)"
        );
    }

    #[test]
    fn inverted_window_display() {
        let err = ConfigError::InvertedWindow {
            sunrise: "19:00".to_string(),
            sunset: "07:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported schedule: sunset 07:00 is not after sunrise 19:00"
        );
    }

    #[test]
    fn error_from_signal_error() {
        let err: Error = SignalError::Closed.into();
        assert!(matches!(err, Error::Signal(SignalError::Closed)));
    }

    #[test]
    fn config_error_from_settings_error() {
        let err: ConfigError = SettingsError::UnknownKey("sunset-time".to_string()).into();
        assert_eq!(
            err.to_string(),
            "settings store error: unknown setting key: sunset-time"
        );
    }

    #[test]
    fn settings_error_display() {
        let err = SettingsError::TypeMismatch {
            key: "enable-theme-timers".to_string(),
            expected: "bool",
        };
        assert_eq!(err.to_string(), "setting enable-theme-timers is not a bool");
    }
}
