// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timers backed by a tokio runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval_at, sleep};

use super::{OnceCallback, RepeatCallback, TimerHandle, Timers};

type Tasks = Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>;

/// [`Timers`] implementation spawning one task per timer.
///
/// Callbacks run on the runtime the timers were created on. Use a
/// current-thread runtime to keep every callback on a single timeline.
/// Cancelling aborts the task; a callback that is already running finishes.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use duskswitch_lib::host::{TokioTimers, Timers};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let timers = TokioTimers::new();
///     let handle = timers.every(Duration::from_secs(60), Arc::new(|| println!("tick")));
///     tokio::time::sleep(Duration::from_secs(300)).await;
///     timers.cancel(handle);
/// }
/// ```
pub struct TokioTimers {
    runtime: Handle,
    next_handle: AtomicU64,
    tasks: Tasks,
}

impl TokioTimers {
    /// Creates timers bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime, like
    /// [`Handle::current`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Creates timers bound to the given runtime.
    #[must_use]
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_handle: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the number of timers that have not fired or been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

impl Timers for TokioTimers {
    fn after(&self, delay: Duration, callback: OnceCallback) -> TimerHandle {
        let handle = self.next_handle();
        let tasks = Arc::clone(&self.tasks);

        // The entry is inserted under the same lock the task takes before
        // removing it, so a zero delay cannot leave a stale entry behind.
        let mut guard = self.tasks.lock();
        let task = self.runtime.spawn(async move {
            sleep(delay).await;
            tasks.lock().remove(&handle);
            callback();
        });
        guard.insert(handle, task.abort_handle());
        drop(guard);

        tracing::trace!(timer = %handle, ?delay, "Armed one-shot timer");
        handle
    }

    fn every(&self, period: Duration, callback: RepeatCallback) -> TimerHandle {
        let handle = self.next_handle();
        let period = period.max(Duration::from_millis(1));

        let task = self.runtime.spawn(async move {
            let mut ticks = interval_at(tokio::time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                callback();
            }
        });
        self.tasks.lock().insert(handle, task.abort_handle());

        tracing::trace!(timer = %handle, ?period, "Armed recurring timer");
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().remove(&handle) {
            tracing::trace!(timer = %handle, "Cancelled timer");
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }
}

impl fmt::Debug for TokioTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioTimers")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
