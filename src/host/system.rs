// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local wall clock.

use chrono::{Local, Utc};

use super::Clock;
use crate::types::WallTime;

/// [`Clock`] reading the local time of the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a system clock.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        WallTime::from(&Local::now())
    }

    fn timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}
