// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Day/night color-scheme scheduling.
//!
//! - [`ThemeScheduler`] - Watches the clock and the settings, applies the scheme
//! - [`SchedulerConfig`] - Setting names, schemes and poll timing
//! - [`DayWindow`] - Pure phase and boundary-crossing decisions
//!
//! The scheduler is driven entirely by the host capabilities in
//! [`crate::host`], so the same code runs against a real event loop or a
//! [`ManualTimeline`](crate::host::ManualTimeline) in tests.

mod config;
mod decision;
mod state;
mod theme_scheduler;

pub use config::{SchedulerConfig, SettingKeys};
pub use decision::{Checkpoint, DayWindow, alignment_delay};
pub use state::SchedulePhase;
pub use theme_scheduler::{Evaluation, MANUAL_CHANGE, ThemeScheduler, ThemeSchedulerBuilder};
