// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for schedule settings.
//!
//! # Types
//!
//! - [`TimeOfDay`] - Minute of the day parsed from `HH:MM` (0-1439)
//! - [`WallTime`] - Host clock reading (hour, minute, second)
//! - [`ColorScheme`] - Interface color-scheme preference
//! - [`Phase`] - Day or night half of the schedule

mod scheme;
mod time;

pub use scheme::{ColorScheme, Phase};
pub use time::{MINUTES_PER_DAY, TimeOfDay, WallTime};
