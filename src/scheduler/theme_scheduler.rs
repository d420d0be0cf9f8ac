// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Day/night color-scheme scheduler.
//!
//! # Architecture
//!
//! ```text
//! start() ──► alignment timer (60 - second + lead)
//!                    │
//!                    ▼
//!              check_and_apply() ──► recurring timer (every 60s)
//!                                          │
//!                                          ▼
//!                                    check_and_apply()
//!
//! check_and_apply():
//!   applying? ─yes─► Reentrant
//!   window invalid? ─yes─► Skipped
//!   overridden && no boundary crossed? ─yes─► OverrideRespected
//!   current == target? ─yes─► Unchanged
//!   pause "manual-change" → write target → resume → Applied
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::config::SchedulerConfig;
use super::decision::{Checkpoint, alignment_delay};
use super::state::{SchedulePhase, ScheduleState};
use crate::error::{ConfigError, Error, Result};
use crate::host::{Clock, STARTUP_COMPLETE, SettingsStore, SystemClock, Timers};
use crate::subscription::{EventSpec, Source, SubscriptionRegistry};
use crate::types::{ColorScheme, TimeOfDay};

/// Name of the subscription that detects color-scheme changes made by
/// anyone but the scheduler.
pub const MANUAL_CHANGE: &str = "manual-change";

/// Outcome of one run of the decision algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Another evaluation was already in flight on this call stack.
    Reentrant,
    /// The configuration could not be evaluated; the theme was left alone.
    Skipped(ConfigError),
    /// A manual override is active and no boundary was crossed.
    OverrideRespected,
    /// The current scheme already matches the schedule.
    Unchanged,
    /// The given scheme was written.
    Applied(ColorScheme),
}

/// Shared core referenced by every callback through a [`Weak`] handle.
struct Shared {
    config: SchedulerConfig,
    settings: Arc<dyn SettingsStore>,
    interface: Arc<dyn SettingsStore>,
    timers: Arc<dyn Timers>,
    clock: Arc<dyn Clock>,
    startup: Option<Source>,
    registry: SubscriptionRegistry,
    state: Mutex<ScheduleState>,
}

/// Clears the `applying` flag when an evaluation ends, however it ends.
struct ApplyingGuard<'a>(&'a Mutex<ScheduleState>);

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().applying = false;
    }
}

/// Switches the interface color scheme between a day and a night value.
///
/// The scheduler listens to four things through its own
/// [`SubscriptionRegistry`]:
///
/// - the enabled flag, to start and stop watching,
/// - the sunrise and sunset settings, to re-read the schedule,
/// - the interface color scheme, as the named [`MANUAL_CHANGE`]
///   subscription, to detect manual overrides,
/// - the optional startup signal, to apply the schedule right away.
///
/// While watching, it evaluates the schedule shortly after every minute
/// boundary. A manual change is respected until the next sunrise or sunset.
/// Its own writes happen with [`MANUAL_CHANGE`] paused, so they never count
/// as manual.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use duskswitch_lib::host::{ManualTimeline, MemorySettings, SettingsStore};
/// use duskswitch_lib::scheduler::ThemeScheduler;
/// use duskswitch_lib::types::WallTime;
///
/// # fn example() -> duskswitch_lib::Result<()> {
/// let settings = Arc::new(
///     MemorySettings::new()
///         .with_bool("enable-theme-timers", true)
///         .with_string("sunrise-time", "07:00")
///         .with_string("sunset-time", "19:00"),
/// );
/// let interface = Arc::new(MemorySettings::new().with_string("color-scheme", "default"));
/// let timeline = Arc::new(ManualTimeline::starting_at(WallTime::new(18, 59, 30)));
///
/// let scheduler = ThemeScheduler::builder()
///     .settings(settings)
///     .interface(interface.clone())
///     .timers(timeline.clone())
///     .clock(timeline.clone())
///     .build()?;
/// scheduler.enable()?;
///
/// timeline.advance_secs(31);
/// assert_eq!(interface.get_string("color-scheme")?, "prefer-dark");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ThemeScheduler {
    shared: Arc<Shared>,
}

impl ThemeScheduler {
    /// Creates a builder for a scheduler.
    #[must_use]
    pub fn builder() -> ThemeSchedulerBuilder {
        ThemeSchedulerBuilder::default()
    }

    /// Registers every listener, reads the initial settings and starts
    /// watching if scheduling is enabled.
    ///
    /// Calling this on an attached scheduler does nothing.
    ///
    /// # Errors
    ///
    /// Returns the registration error of the first listener a source
    /// rejected. Listeners registered before the failure are torn down.
    pub fn enable(&self) -> Result<()> {
        if self.shared.state.lock().attached {
            return Ok(());
        }

        if let Err(e) = Shared::attach(&self.shared) {
            tracing::warn!(error = %e, "Failed to attach theme scheduler");
            self.shared.registry.disconnect_all();
            return Err(e);
        }

        self.shared.reload_times();
        let enabled = self.shared.read_enabled().unwrap_or(false);
        {
            let mut state = self.shared.state.lock();
            state.attached = true;
            state.enabled = enabled;
        }
        tracing::debug!(enabled, "Theme scheduler attached");

        if enabled {
            Shared::start(&self.shared);
        }
        Ok(())
    }

    /// Stops watching and tears down every listener.
    ///
    /// The active theme is treated as manually chosen from here on. Safe to
    /// call repeatedly.
    pub fn disable(&self) {
        self.shared.stop();
        self.shared.registry.disconnect_all();

        let mut state = self.shared.state.lock();
        if state.attached {
            tracing::debug!("Theme scheduler detached");
        }
        state.attached = false;
        state.manually_overridden = true;
    }

    /// Starts watching: arms the alignment timer for the next minute
    /// boundary. Does nothing if already watching.
    pub fn start(&self) {
        Shared::start(&self.shared);
    }

    /// Stops watching: cancels the alignment and recurring timers. Does
    /// nothing if already stopped.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Runs the decision algorithm once, now.
    pub fn check_and_apply(&self) -> Evaluation {
        self.shared.check_and_apply()
    }

    /// Returns `true` while the poll timers are running.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.shared.state.lock().phase == SchedulePhase::Watching
    }

    /// Returns the last observed value of the enabled flag.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    /// Returns `true` while a manual override is being respected.
    #[must_use]
    pub fn is_manually_overridden(&self) -> bool {
        self.shared.state.lock().manually_overridden
    }

    /// Returns `true` while an evaluation is in flight.
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.shared.state.lock().applying
    }

    /// Returns the registry holding the scheduler's listeners.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.shared.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }
}

impl Drop for ThemeScheduler {
    fn drop(&mut self) {
        self.disable();
    }
}

impl fmt::Debug for ThemeScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ThemeScheduler")
            .field("phase", &state.phase)
            .field("enabled", &state.enabled)
            .field("manually_overridden", &state.manually_overridden)
            .field("subscriptions", &self.shared.registry)
            .finish_non_exhaustive()
    }
}

impl Shared {
    // =========================================================================
    // Listeners
    // =========================================================================

    fn attach(this: &Arc<Self>) -> Result<()> {
        let keys = &this.config.keys;

        let weak = Arc::downgrade(this);
        this.registry.connect_named(
            MANUAL_CHANGE,
            this.interface.clone(),
            EventSpec::changed(&keys.color_scheme),
            move |_| with_shared(&weak, Self::mark_manual),
        )?;

        let weak = Arc::downgrade(this);
        this.registry.connect(
            this.settings.clone(),
            EventSpec::changed(&keys.enabled),
            move |_| with_shared(&weak, Self::on_enabled_changed),
        )?;

        for key in [&keys.sunrise, &keys.sunset] {
            let weak = Arc::downgrade(this);
            this.registry.connect(
                this.settings.clone(),
                EventSpec::changed(key),
                move |_| with_shared(&weak, |shared| shared.reload_times()),
            )?;
        }

        if let Some(startup) = &this.startup {
            let weak = Arc::downgrade(this);
            this.registry.connect(
                Arc::clone(startup),
                STARTUP_COMPLETE,
                move |_| with_shared(&weak, Self::on_startup_complete),
            )?;
        }
        Ok(())
    }

    fn mark_manual(this: &Arc<Self>) {
        let mut state = this.state.lock();
        if !state.manually_overridden {
            tracing::debug!("Color scheme changed manually");
        }
        state.manually_overridden = true;
    }

    fn on_enabled_changed(this: &Arc<Self>) {
        let Some(enabled) = this.read_enabled() else {
            return;
        };

        let was_enabled = {
            let mut state = this.state.lock();
            let was_enabled = state.enabled;
            state.enabled = enabled;
            if enabled && !was_enabled {
                // The theme in place when scheduling is switched on is the
                // user's until the next boundary.
                state.manually_overridden = true;
            }
            was_enabled
        };

        match (was_enabled, enabled) {
            (false, true) => {
                tracing::info!("Theme scheduling enabled");
                Self::start(this);
            }
            (_, false) => {
                if was_enabled {
                    tracing::info!("Theme scheduling disabled");
                }
                this.stop();
            }
            (true, true) => {}
        }
    }

    fn on_startup_complete(this: &Arc<Self>) {
        tracing::debug!("Startup complete, checking theme");
        log_outcome(&this.check_and_apply());
    }

    fn read_enabled(&self) -> Option<bool> {
        let key = &self.config.keys.enabled;
        match self.settings.get_bool(key) {
            Ok(enabled) => Some(enabled),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cannot read enabled flag");
                None
            }
        }
    }

    fn read_time(&self, key: &str) -> std::result::Result<TimeOfDay, ConfigError> {
        let parsed = self
            .settings
            .get_string(key)
            .map_err(ConfigError::from)
            .and_then(|raw| raw.parse::<TimeOfDay>());
        if let Err(e) = &parsed {
            tracing::warn!(key = %key, error = %e, "Invalid schedule time");
        }
        parsed
    }

    fn reload_times(&self) {
        let sunrise = self.read_time(&self.config.keys.sunrise);
        let sunset = self.read_time(&self.config.keys.sunset);
        tracing::debug!(?sunrise, ?sunset, "Schedule times loaded");

        let mut state = self.state.lock();
        state.sunrise = sunrise;
        state.sunset = sunset;
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn start(this: &Arc<Self>) {
        let generation = {
            let mut state = this.state.lock();
            if state.phase == SchedulePhase::Watching {
                return;
            }
            state.phase = SchedulePhase::Watching;
            state.generation += 1;
            state.last_evaluated = None;
            state.generation
        };

        if let Err(e) = this.registry.resume(MANUAL_CHANGE) {
            tracing::warn!(error = %e, "Cannot resume manual-change listener");
        }

        let delay = alignment_delay(this.clock.now(), this.config.tick_lead());
        let weak = Arc::downgrade(this);
        let handle = this.timers.after(
            delay,
            Box::new(move || with_shared(&weak, |shared| Self::on_aligned(shared, generation))),
        );

        let mut state = this.state.lock();
        if state.generation == generation {
            state.alignment = Some(handle);
            drop(state);
            tracing::debug!(?delay, "Watching time");
        } else {
            drop(state);
            this.timers.cancel(handle);
        }
    }

    fn on_aligned(this: &Arc<Self>, generation: u64) {
        {
            let mut state = this.state.lock();
            if state.generation != generation {
                return;
            }
            state.alignment = None;
        }

        log_outcome(&this.check_and_apply());

        let weak = Arc::downgrade(this);
        let handle = this.timers.every(
            this.config.poll_interval(),
            Arc::new(move || with_shared(&weak, |shared| shared.on_poll(generation))),
        );

        // The evaluation above may have stopped the scheduler.
        let mut state = this.state.lock();
        if state.generation == generation && state.phase == SchedulePhase::Watching {
            state.recurring = Some(handle);
        } else {
            drop(state);
            this.timers.cancel(handle);
        }
    }

    fn on_poll(&self, generation: u64) {
        if self.state.lock().generation != generation {
            return;
        }
        log_outcome(&self.check_and_apply());
    }

    fn stop(&self) {
        let timers = {
            let mut state = self.state.lock();
            if state.phase == SchedulePhase::Stopped {
                return;
            }
            state.phase = SchedulePhase::Stopped;
            state.generation += 1;
            state.take_timers()
        };

        for handle in timers.into_iter().flatten() {
            self.timers.cancel(handle);
        }
        tracing::debug!("Stopped watching time");
    }

    // =========================================================================
    // Decision
    // =========================================================================

    fn check_and_apply(&self) -> Evaluation {
        let now = Checkpoint::new(self.clock.now().minutes_of_day(), self.clock.timestamp());
        let now_minutes = now.minute;

        let (window, overridden, last_evaluated) = {
            let mut state = self.state.lock();
            if state.applying {
                return Evaluation::Reentrant;
            }
            let window = match state.window() {
                Ok(window) => window,
                Err(e) => return Evaluation::Skipped(e),
            };
            state.applying = true;
            (window, state.manually_overridden, state.last_evaluated)
        };
        let _applying = ApplyingGuard(&self.state);

        let phase = window.phase_at(now_minutes);
        let target = self.config.scheme_for(phase);
        tracing::trace!(now_minutes, %phase, %target, "Evaluating schedule");

        if overridden {
            if window.crossed_boundary(last_evaluated, now) {
                self.state.lock().manually_overridden = false;
                tracing::info!(%phase, "Transition time reached, resetting manual override");
            } else {
                self.record_evaluation(now);
                return Evaluation::OverrideRespected;
            }
        }

        let key = &self.config.keys.color_scheme;
        let current = match self.interface.get_string(key) {
            Ok(current) => current,
            Err(e) => return Evaluation::Skipped(e.into()),
        };
        if current == target.as_str() {
            self.record_evaluation(now);
            return Evaluation::Unchanged;
        }

        self.registry.pause(MANUAL_CHANGE);
        let written = self.interface.set_string(key, target.as_str());
        if self.state.lock().enabled {
            if let Err(e) = self.registry.resume(MANUAL_CHANGE) {
                tracing::warn!(error = %e, "Cannot resume manual-change listener");
            }
        }

        match written {
            Ok(()) => {
                self.record_evaluation(now);
                tracing::info!(%phase, scheme = %target, previous = %current, "Applied color scheme");
                Evaluation::Applied(target)
            }
            Err(e) => Evaluation::Skipped(e.into()),
        }
    }

    fn record_evaluation(&self, now: Checkpoint) {
        self.state.lock().last_evaluated = Some(now);
    }
}

/// Runs `f` if the scheduler is still alive.
fn with_shared<F>(weak: &Weak<Shared>, f: F)
where
    F: FnOnce(&Arc<Shared>),
{
    if let Some(shared) = weak.upgrade() {
        f(&shared);
    }
}

fn log_outcome(outcome: &Evaluation) {
    match outcome {
        Evaluation::Skipped(e) => tracing::warn!(error = %e, "Skipping theme check"),
        other => tracing::trace!(outcome = ?other, "Theme check finished"),
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ThemeScheduler`].
///
/// `settings`, `interface` and `timers` are required. The clock defaults to
/// [`SystemClock`] and the startup signal is optional.
#[derive(Default)]
pub struct ThemeSchedulerBuilder {
    config: SchedulerConfig,
    settings: Option<Arc<dyn SettingsStore>>,
    interface: Option<Arc<dyn SettingsStore>>,
    timers: Option<Arc<dyn Timers>>,
    clock: Option<Arc<dyn Clock>>,
    startup: Option<Source>,
}

impl ThemeSchedulerBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the store holding the enabled flag and the schedule times.
    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the store holding the interface color scheme.
    #[must_use]
    pub fn interface(mut self, interface: Arc<dyn SettingsStore>) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Sets the timer facility.
    #[must_use]
    pub fn timers(mut self, timers: Arc<dyn Timers>) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Sets the wall clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the source emitting `startup-complete`.
    #[must_use]
    pub fn startup(mut self, startup: Source) -> Self {
        self.startup = Some(startup);
        self
    }

    /// Builds the scheduler. Nothing is registered until
    /// [`ThemeScheduler::enable`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingService`] if a required collaborator is
    /// missing, or [`Error::Config`] if the configuration is invalid.
    pub fn build(self) -> Result<ThemeScheduler> {
        self.config.validate()?;
        let settings = self.settings.ok_or(Error::MissingService("settings"))?;
        let interface = self.interface.ok_or(Error::MissingService("interface"))?;
        let timers = self.timers.ok_or(Error::MissingService("timers"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        Ok(ThemeScheduler {
            shared: Arc::new(Shared {
                config: self.config,
                settings,
                interface,
                timers,
                clock,
                startup: self.startup,
                registry: SubscriptionRegistry::new(),
                state: Mutex::new(ScheduleState::default()),
            }),
        })
    }
}

impl fmt::Debug for ThemeSchedulerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSchedulerBuilder")
            .field("config", &self.config)
            .field("settings", &self.settings.is_some())
            .field("interface", &self.interface.is_some())
            .field("timers", &self.timers.is_some())
            .field("clock", &self.clock.is_some())
            .field("startup", &self.startup.is_some())
            .finish()
    }
}
