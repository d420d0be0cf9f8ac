// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `DuskSwitch` Lib - Switch a desktop color scheme between day and night.
//!
//! This library provides two building blocks:
//!
//! - A [`SubscriptionRegistry`] that records every listener a component
//!   attaches to an observable source, so the whole set can be torn down in
//!   one call. Named subscriptions can be paused and resumed.
//! - A [`ThemeScheduler`] that writes a day scheme between sunrise and sunset
//!   and a night scheme otherwise, while respecting manual changes until the
//!   next boundary.
//!
//! Host services (settings storage, timers and the wall clock) are injected
//! through the traits in [`host`]. In-memory and tokio-backed implementations
//! are included.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use duskswitch_lib::ThemeScheduler;
//! use duskswitch_lib::host::{MemorySettings, SystemClock, TokioTimers};
//!
//! #[tokio::main]
//! async fn main() -> duskswitch_lib::Result<()> {
//!     let settings = Arc::new(MemorySettings::from_json(
//!         r#"{
//!             "enable-theme-timers": true,
//!             "sunrise-time": "07:00",
//!             "sunset-time": "19:00"
//!         }"#,
//!     )?);
//!     let interface = Arc::new(MemorySettings::new().with_string("color-scheme", "default"));
//!
//!     let scheduler = ThemeScheduler::builder()
//!         .settings(settings)
//!         .interface(interface)
//!         .timers(Arc::new(TokioTimers::new()))
//!         .clock(Arc::new(SystemClock::new()))
//!         .build()?;
//!     scheduler.enable()?;
//!
//!     tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
//!     scheduler.disable();
//!     Ok(())
//! }
//! ```
//!
//! # Testing Against a Manual Clock
//!
//! [`ManualTimeline`](host::ManualTimeline) implements both the clock and the
//! timers, so a whole day can be replayed synchronously:
//!
//! ```
//! use std::sync::Arc;
//! use duskswitch_lib::host::{ManualTimeline, MemorySettings, SettingsStore};
//! use duskswitch_lib::types::WallTime;
//! use duskswitch_lib::ThemeScheduler;
//!
//! let settings = Arc::new(
//!     MemorySettings::new()
//!         .with_bool("enable-theme-timers", true)
//!         .with_string("sunrise-time", "07:00")
//!         .with_string("sunset-time", "19:00"),
//! );
//! let interface = Arc::new(MemorySettings::new().with_string("color-scheme", "prefer-dark"));
//! let timeline = Arc::new(ManualTimeline::starting_at(WallTime::new(6, 0, 0)));
//!
//! let scheduler = ThemeScheduler::builder()
//!     .settings(settings)
//!     .interface(interface.clone())
//!     .timers(timeline.clone())
//!     .clock(timeline.clone())
//!     .build()
//!     .unwrap();
//! scheduler.enable().unwrap();
//!
//! timeline.advance_secs(61 * 60);
//! assert_eq!(interface.get_string("color-scheme").unwrap(), "default");
//! ```

pub mod error;
pub mod host;
pub mod scheduler;
pub mod subscription;
pub mod types;

pub use error::{ConfigError, Error, Result, SettingsError, SignalError};
pub use scheduler::{Evaluation, SchedulerConfig, ThemeScheduler, ThemeSchedulerBuilder};
pub use subscription::{EventSpec, Observable, SubscriptionId, SubscriptionRegistry};
pub use types::{ColorScheme, Phase, TimeOfDay, WallTime};
