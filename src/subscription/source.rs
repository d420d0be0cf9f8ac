// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observable sources and the values exchanged with them.
//!
//! A source is anything a listener can be attached to: a settings store
//! emitting `changed::<key>`, a startup notifier emitting `startup-complete`,
//! or a host object adapted to the [`Observable`] trait.

use std::fmt;
use std::sync::Arc;

use crate::error::SignalError;

/// Identifier issued by a source for one live registration.
///
/// Sources mint these in [`Observable::connect`] and accept them back in
/// [`Observable::disconnect`]. They are only meaningful to the source that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Creates a handler ID with the given value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// The event a listener is interested in.
///
/// An event has a signal name and an optional detail, written
/// `signal::detail` (for example `changed::color-scheme`). A spec without a
/// detail matches every emission of that signal.
///
/// # Examples
///
/// ```
/// use duskswitch_lib::subscription::EventSpec;
///
/// let any_change = EventSpec::new("changed");
/// let scheme_change = EventSpec::changed("color-scheme");
///
/// assert_eq!(scheme_change.to_string(), "changed::color-scheme");
/// assert!(any_change.matches(&scheme_change));
/// assert!(!scheme_change.matches(&EventSpec::changed("sunset-time")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventSpec {
    signal: String,
    detail: Option<String>,
}

impl EventSpec {
    /// Creates a spec for a signal without detail.
    #[must_use]
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            detail: None,
        }
    }

    /// Creates a `changed::<key>` spec.
    #[must_use]
    pub fn changed(key: impl Into<String>) -> Self {
        Self::new("changed").with_detail(key)
    }

    /// Sets the detail part.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the signal name.
    #[must_use]
    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Returns the detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns `true` if a listener registered with `self` should receive
    /// the `emitted` event.
    #[must_use]
    pub fn matches(&self, emitted: &EventSpec) -> bool {
        self.signal == emitted.signal
            && match &self.detail {
                None => true,
                Some(detail) => emitted.detail.as_ref() == Some(detail),
            }
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}::{detail}", self.signal),
            None => f.write_str(&self.signal),
        }
    }
}

impl From<&str> for EventSpec {
    fn from(s: &str) -> Self {
        match s.split_once("::") {
            Some((signal, detail)) => Self::new(signal).with_detail(detail),
            None => Self::new(s),
        }
    }
}

impl From<String> for EventSpec {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Callback attached to a source.
///
/// The handler receives the event that was emitted, which may carry a more
/// specific detail than the spec it was registered with.
pub type Handler = Arc<dyn Fn(&EventSpec) + Send + Sync>;

/// A source listeners can be attached to.
///
/// Implementations are free to dispatch synchronously from within their own
/// write operations. They must not call back into the caller of `connect` or
/// `disconnect` while those calls are in progress.
pub trait Observable: Send + Sync {
    /// Attaches `handler` for events matching `spec`.
    ///
    /// # Errors
    ///
    /// Returns a [`SignalError`] if the source rejects the registration, for
    /// example because it never emits the requested signal.
    fn connect(&self, spec: &EventSpec, handler: Handler) -> Result<HandlerId, SignalError>;

    /// Detaches a previously connected handler.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::UnknownHandler`] if `id` is not (or no longer)
    /// registered on this source.
    fn disconnect(&self, id: HandlerId) -> Result<(), SignalError>;
}

/// Shared handle to an observable source.
pub type Source = Arc<dyn Observable>;
