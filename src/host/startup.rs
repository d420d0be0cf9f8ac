// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot host startup notification.

use std::sync::atomic::{AtomicBool, Ordering};

use super::listeners::Listeners;
use crate::error::SignalError;
use crate::subscription::{EventSpec, Handler, HandlerId, Observable};

/// Signal emitted once the host has finished starting up.
pub const STARTUP_COMPLETE: &str = "startup-complete";

/// Source emitting [`STARTUP_COMPLETE`] exactly once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use duskswitch_lib::host::{STARTUP_COMPLETE, StartupSignal};
/// use duskswitch_lib::subscription::SubscriptionRegistry;
///
/// let startup = Arc::new(StartupSignal::new());
/// let registry = SubscriptionRegistry::new();
/// let fired = Arc::new(AtomicU32::new(0));
/// let fired_clone = fired.clone();
///
/// registry.connect(startup.clone(), STARTUP_COMPLETE, move |_| {
///     fired_clone.fetch_add(1, Ordering::SeqCst);
/// }).unwrap();
///
/// startup.complete();
/// startup.complete();
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct StartupSignal {
    completed: AtomicBool,
    listeners: Listeners,
}

impl StartupSignal {
    /// Creates a signal that has not fired yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            completed: AtomicBool::new(false),
            listeners: Listeners::new(),
        }
    }

    /// Fires the signal. Only the first call notifies listeners.
    pub fn complete(&self) {
        if self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Host startup complete");
        self.listeners.emit(&EventSpec::new(STARTUP_COMPLETE));
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Observable for StartupSignal {
    fn connect(&self, spec: &EventSpec, handler: Handler) -> Result<HandlerId, SignalError> {
        if spec.signal() != STARTUP_COMPLETE {
            return Err(SignalError::UnknownSignal(spec.to_string()));
        }
        Ok(self.listeners.add(spec, handler))
    }

    fn disconnect(&self, id: HandlerId) -> Result<(), SignalError> {
        self.listeners.remove(id)
    }
}

impl Default for StartupSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StartupSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupSignal")
            .field("completed", &self.is_complete())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
