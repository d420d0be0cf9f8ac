// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deterministic clock and timers advanced by hand.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Clock, OnceCallback, RepeatCallback, TimerHandle, Timers};
use crate::types::WallTime;

/// Smallest recurring interval; keeps a zero interval from spinning forever.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

enum Callback {
    Once(OnceCallback),
    Repeat(RepeatCallback, Duration),
}

struct Armed {
    due: Duration,
    callback: Callback,
}

struct State {
    /// Wall time at construction, in seconds since midnight.
    origin: u32,
    /// Monotonic time since construction.
    elapsed: Duration,
    /// Extra wall-clock time that passed without the monotonic clock moving.
    suspended: Duration,
    /// Shift of local time against the absolute timeline, in seconds.
    local_shift: i64,
    next_handle: u64,
    timers: BTreeMap<u64, Armed>,
}

impl State {
    /// Seconds since the origin's midnight, ignoring local shifts.
    fn timestamp(&self) -> i64 {
        let seconds = u64::from(self.origin) + self.elapsed.as_secs() + self.suspended.as_secs();
        i64::try_from(seconds).unwrap_or(i64::MAX)
    }

    fn wall_time(&self) -> WallTime {
        let local = self.timestamp().saturating_add(self.local_shift);
        let seconds = u32::try_from(local.rem_euclid(86_400)).unwrap_or_default();
        WallTime::from_seconds_of_day(seconds)
    }

    fn arm(&mut self, due: Duration, callback: Callback) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.timers.insert(handle, Armed { due, callback });
        TimerHandle::new(handle)
    }

    /// Removes and returns the earliest timer due at or before `until`.
    fn pop_due(&mut self, until: Duration) -> Option<(u64, Armed)> {
        let (&handle, _) = self
            .timers
            .iter()
            .filter(|(_, armed)| armed.due <= until)
            .min_by_key(|(handle, armed)| (armed.due, **handle))?;
        self.timers.remove(&handle).map(|armed| (handle, armed))
    }
}

/// A host event loop whose clock only moves when told to.
///
/// `ManualTimeline` implements both [`Clock`] and [`Timers`]. Time advances
/// through [`advance`](Self::advance), which fires every timer falling due in
/// order; while a callback runs, the clock reads the instant that timer was
/// due. Callbacks run with the timeline unlocked, so they may arm or cancel
/// timers themselves.
///
/// [`suspend_for`](Self::suspend_for) moves wall-clock time without firing
/// anything, the way a suspended machine sees the wall clock jump while its
/// monotonic timers stand still. [`shift_local_time`](Self::shift_local_time)
/// moves only the local reading, like a daylight saving change.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
/// use duskswitch_lib::host::{Clock, ManualTimeline, Timers};
/// use duskswitch_lib::types::WallTime;
///
/// let timeline = ManualTimeline::starting_at(WallTime::new(6, 59, 30));
/// let ticks = Arc::new(AtomicU32::new(0));
/// let ticks_clone = ticks.clone();
///
/// timeline.every(Duration::from_secs(60), Arc::new(move || {
///     ticks_clone.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// timeline.advance(Duration::from_secs(180));
/// assert_eq!(ticks.load(Ordering::SeqCst), 3);
/// assert_eq!(timeline.now(), WallTime::new(7, 2, 30));
/// ```
pub struct ManualTimeline {
    state: Mutex<State>,
}

impl ManualTimeline {
    /// Creates a timeline whose clock starts at `start`.
    #[must_use]
    pub fn starting_at(start: WallTime) -> Self {
        Self {
            state: Mutex::new(State {
                origin: start.seconds_of_day(),
                elapsed: Duration::ZERO,
                suspended: Duration::ZERO,
                local_shift: 0,
                next_handle: 1,
                timers: BTreeMap::new(),
            }),
        }
    }

    /// Moves time forward by `by`, firing every timer that falls due.
    pub fn advance(&self, by: Duration) {
        let until = self.state.lock().elapsed + by;

        loop {
            let fired = {
                let mut state = self.state.lock();
                match state.pop_due(until) {
                    Some((handle, armed)) => {
                        state.elapsed = state.elapsed.max(armed.due);
                        match armed.callback {
                            Callback::Once(callback) => Some(callback),
                            Callback::Repeat(callback, interval) => {
                                let next = armed.due + interval;
                                state.timers.insert(
                                    handle,
                                    Armed {
                                        due: next,
                                        callback: Callback::Repeat(callback.clone(), interval),
                                    },
                                );
                                Some(Box::new(move || callback()) as OnceCallback)
                            }
                        }
                    }
                    None => {
                        state.elapsed = until;
                        None
                    }
                }
            };

            match fired {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// Shorthand for [`advance`](Self::advance) in whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Moves the wall clock forward by `by` without firing any timer.
    ///
    /// Timers keep their monotonic due times, so the next
    /// [`advance`](Self::advance) fires them late relative to the wall clock.
    pub fn suspend_for(&self, by: Duration) {
        self.state.lock().suspended += by;
    }

    /// Moves the local wall clock by `secs` (negative to go back) without any
    /// time passing, the way a daylight saving or time-zone change does.
    ///
    /// [`Clock::timestamp`] is unaffected and no timer fires.
    pub fn shift_local_time(&self, secs: i64) {
        let mut state = self.state.lock();
        state.local_shift = state.local_shift.saturating_add(secs);
    }

    /// Returns the number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Returns `true` if `handle` is still armed.
    #[must_use]
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.state.lock().timers.contains_key(&handle.value())
    }

    /// Returns the monotonic time elapsed since construction.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }
}

impl Clock for ManualTimeline {
    fn now(&self) -> WallTime {
        self.state.lock().wall_time()
    }

    fn timestamp(&self) -> i64 {
        self.state.lock().timestamp()
    }
}

impl Timers for ManualTimeline {
    fn after(&self, delay: Duration, callback: OnceCallback) -> TimerHandle {
        let mut state = self.state.lock();
        let due = state.elapsed + delay;
        state.arm(due, Callback::Once(callback))
    }

    fn every(&self, interval: Duration, callback: RepeatCallback) -> TimerHandle {
        let interval = interval.max(MIN_INTERVAL);
        let mut state = self.state.lock();
        let due = state.elapsed + interval;
        state.arm(due, Callback::Repeat(callback, interval))
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state.lock().timers.remove(&handle.value());
    }
}

impl fmt::Debug for ManualTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimeline")
            .field("now", &state.wall_time())
            .field("elapsed", &state.elapsed)
            .field("pending", &state.timers.len())
            .finish()
    }
}
