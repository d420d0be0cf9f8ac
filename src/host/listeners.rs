// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener list shared by the in-process sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::SignalError;
use crate::subscription::{EventSpec, Handler, HandlerId};

struct Listener {
    id: HandlerId,
    spec: EventSpec,
    handler: Handler,
}

/// Registered handlers of one source.
///
/// Emission snapshots the matching handlers and calls them with the lock
/// released, so handlers may connect, disconnect or write back into the
/// source that is dispatching.
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<Listener>>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, spec: &EventSpec, handler: Handler) -> HandlerId {
        let id = HandlerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(Listener {
            id,
            spec: spec.clone(),
            handler,
        });
        id
    }

    pub(crate) fn remove(&self, id: HandlerId) -> Result<(), SignalError> {
        let mut entries = self.entries.lock();
        let pos = entries
            .iter()
            .position(|listener| listener.id == id)
            .ok_or(SignalError::UnknownHandler(id))?;
        entries.remove(pos);
        Ok(())
    }

    /// Calls every handler whose spec matches `event`, in registration order.
    pub(crate) fn emit(&self, event: &EventSpec) {
        let matching: Vec<Handler> = self
            .entries
            .lock()
            .iter()
            .filter(|listener| listener.spec.matches(event))
            .map(|listener| Arc::clone(&listener.handler))
            .collect();

        for handler in matching {
            handler(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
