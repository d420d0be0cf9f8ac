// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host capabilities consumed by the scheduler.
//!
//! The scheduler never reaches for ambient host state. Everything it needs
//! is injected through these narrow traits:
//!
//! - [`SettingsStore`] - Key/value settings with `changed::<key>` notifications
//! - [`Timers`] - One-shot and recurring timers
//! - [`Clock`] - Wall-clock readings
//!
//! The module also ships in-process implementations:
//!
//! - [`MemorySettings`] - Schema-checked in-memory settings store
//! - [`StartupSignal`] - One-shot `startup-complete` source
//! - [`ManualTimeline`] - Deterministic clock and timers driven by hand
//! - [`SystemClock`] - Local wall time
//! - [`TokioTimers`] - Timers running on a tokio runtime (feature `tokio`)

mod listeners;
mod memory;
mod startup;
mod system;
mod timeline;
#[cfg(feature = "tokio")]
mod tokio_timers;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use memory::{MemorySettings, SettingValue};
pub use startup::{STARTUP_COMPLETE, StartupSignal};
pub use system::SystemClock;
pub use timeline::ManualTimeline;
#[cfg(feature = "tokio")]
pub use tokio_timers::TokioTimers;

use crate::error::SettingsError;
use crate::subscription::Observable;
use crate::types::WallTime;

/// A key/value settings store.
///
/// Writes notify listeners connected for `changed::<key>` (or plain
/// `changed`) through the [`Observable`] supertrait. Notification may happen
/// synchronously, before the write call returns.
pub trait SettingsStore: Observable {
    /// Reads a boolean value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the key is unknown or not a boolean.
    fn get_bool(&self, key: &str) -> Result<bool, SettingsError>;

    /// Reads a string value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the key is unknown or not a string.
    fn get_string(&self, key: &str) -> Result<String, SettingsError>;

    /// Writes a boolean value and notifies listeners.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the key is unknown or not a boolean.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), SettingsError>;

    /// Writes a string value and notifies listeners.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the key is unknown or not a string.
    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Handle to an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Creates a timer handle with the given value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({})", self.0)
    }
}

/// Callback for a one-shot timer.
pub type OnceCallback = Box<dyn FnOnce() + Send>;

/// Callback for a recurring timer.
pub type RepeatCallback = Arc<dyn Fn() + Send + Sync>;

/// Timer facility of the host event loop.
pub trait Timers: Send + Sync {
    /// Runs `callback` once after `delay`.
    fn after(&self, delay: Duration, callback: OnceCallback) -> TimerHandle;

    /// Runs `callback` every `interval`, first after one interval.
    fn every(&self, interval: Duration, callback: RepeatCallback) -> TimerHandle;

    /// Cancels a timer. Unknown or already fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

/// Wall-clock source.
pub trait Clock: Send + Sync {
    /// Returns the current local wall time.
    fn now(&self) -> WallTime;

    /// Returns the current time in seconds on an absolute timeline, such as
    /// Unix time.
    ///
    /// Unlike [`now`](Self::now) it does not follow time-zone or daylight
    /// saving shifts, so it only moves backward when the clock itself is set
    /// back.
    fn timestamp(&self) -> i64;
}
