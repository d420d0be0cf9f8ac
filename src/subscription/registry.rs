// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bookkeeping of listener registrations against observable sources.
//!
//! This module provides:
//!
//! - [`SubscriptionId`] - Registry-issued identifier for one subscription
//! - [`SubscriptionRegistry`] - Tracks, pauses, resumes and tears down
//!   registrations so a shutdown path never leaks a callback

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::source::{EventSpec, Handler, HandlerId, Observable, Source};
use crate::error::Result;

/// Handle returned by [`SubscriptionRegistry::connect`] and
/// [`SubscriptionRegistry::connect_named`], accepted back by
/// [`SubscriptionRegistry::disconnect`].
///
/// Handles are issued in registration order and never reused by the
/// registry that issued them. A named subscription keeps its handle across
/// pause and resume, even though the source hands out a fresh [`HandlerId`]
/// on every re-registration; replacing the name issues a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Position of the registration in the registry's sequence, from 1.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// One registration, live or paused.
struct Entry {
    id: SubscriptionId,
    source: Source,
    spec: EventSpec,
    handler: Handler,
    /// `None` while paused.
    live: Option<HandlerId>,
}

impl Entry {
    fn belongs_to(&self, source: *const ()) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.source), source)
    }

    /// Detaches the live registration, if any. Errors are swallowed.
    fn teardown(self) {
        if let Some(handler_id) = self.live {
            detach(&self.source, handler_id, &self.spec);
        }
    }
}

fn detach(source: &Source, handler_id: HandlerId, spec: &EventSpec) {
    if let Err(e) = source.disconnect(handler_id) {
        tracing::debug!(
            spec = %spec,
            handler = %handler_id,
            error = %e,
            "Ignoring teardown error"
        );
    }
}

#[derive(Default)]
struct Entries {
    /// Anonymous subscriptions, grouped only by their source.
    anonymous: Vec<Entry>,
    /// Named subscriptions, addressable individually.
    named: HashMap<String, Entry>,
}

/// Registry of listener registrations owned by one module.
///
/// Subscriptions are either *anonymous* (grouped by source, torn down in
/// bulk) or *named* (individually pausable and resumable). Every teardown
/// operation is idempotent: disconnecting something that is already gone is
/// treated as success, since shutdown paths often run more than once.
///
/// The registry never holds its lock while calling into a source, so a
/// source may dispatch synchronously into handlers that query the registry.
/// Dropping the registry disconnects everything it still holds.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use duskswitch_lib::host::MemorySettings;
/// use duskswitch_lib::subscription::{EventSpec, SubscriptionRegistry};
///
/// # fn example() -> duskswitch_lib::Result<()> {
/// let settings = Arc::new(MemorySettings::new().with_string("color-scheme", "default"));
/// let registry = SubscriptionRegistry::new();
///
/// registry.connect_named("manual-change", settings.clone(), EventSpec::changed("color-scheme"), |_| {
///     println!("theme changed");
/// })?;
///
/// registry.pause("manual-change");
/// assert!(registry.is_paused("manual-change"));
///
/// registry.resume("manual-change")?;
/// assert!(registry.is_connected("manual-change"));
///
/// registry.disconnect_all();
/// assert!(registry.is_empty());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct SubscriptionRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    entries: Mutex<Entries>,
}

impl SubscriptionRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers `handler` on `source` as an anonymous subscription.
    ///
    /// # Errors
    ///
    /// Propagates the source's registration error. Nothing is recorded in
    /// that case.
    pub fn connect<F>(
        &self,
        source: Source,
        spec: impl Into<EventSpec>,
        handler: F,
    ) -> Result<SubscriptionId>
    where
        F: Fn(&EventSpec) + Send + Sync + 'static,
    {
        let spec = spec.into();
        let handler: Handler = Arc::new(handler);
        let handler_id = source.connect(&spec, Arc::clone(&handler))?;

        let id = self.next_id();
        tracing::debug!(subscription = %id, spec = %spec, "Connected anonymous subscription");
        self.entries.lock().anonymous.push(Entry {
            id,
            source,
            spec,
            handler,
            live: Some(handler_id),
        });
        Ok(id)
    }

    /// Registers `handler` on `source` under `name`.
    ///
    /// If `name` is already in use, the new handler is registered first and
    /// only then is the previous one torn down, so exactly one handler for
    /// `name` remains afterwards.
    ///
    /// # Errors
    ///
    /// Propagates the source's registration error. The previous subscription
    /// under `name`, if any, is left untouched in that case.
    pub fn connect_named<F>(
        &self,
        name: impl Into<String>,
        source: Source,
        spec: impl Into<EventSpec>,
        handler: F,
    ) -> Result<SubscriptionId>
    where
        F: Fn(&EventSpec) + Send + Sync + 'static,
    {
        let name = name.into();
        let spec = spec.into();
        let handler: Handler = Arc::new(handler);
        let handler_id = source.connect(&spec, Arc::clone(&handler))?;

        let id = self.next_id();
        tracing::debug!(name = %name, subscription = %id, spec = %spec, "Connected named subscription");
        let replaced = self.entries.lock().named.insert(
            name,
            Entry {
                id,
                source,
                spec,
                handler,
                live: Some(handler_id),
            },
        );

        if let Some(previous) = replaced {
            tracing::debug!(subscription = %previous.id, "Replaced named subscription");
            previous.teardown();
        }
        Ok(id)
    }

    // =========================================================================
    // Pause / resume
    // =========================================================================

    /// Detaches the named subscription but keeps what is needed to resume it.
    ///
    /// Does nothing if `name` is unknown or already paused.
    pub fn pause(&self, name: &str) {
        let detached = {
            let mut entries = self.entries.lock();
            entries.named.get_mut(name).and_then(|entry| {
                entry
                    .live
                    .take()
                    .map(|handler_id| (Arc::clone(&entry.source), handler_id, entry.spec.clone()))
            })
        };

        if let Some((source, handler_id, spec)) = detached {
            tracing::debug!(name = %name, "Pausing named subscription");
            detach(&source, handler_id, &spec);
        }
    }

    /// Re-attaches a paused named subscription with its original source,
    /// event and handler.
    ///
    /// Does nothing if `name` is unknown or already connected.
    ///
    /// # Errors
    ///
    /// Propagates the source's registration error. The subscription stays
    /// paused in that case.
    pub fn resume(&self, name: &str) -> Result<()> {
        let pending = {
            let entries = self.entries.lock();
            match entries.named.get(name) {
                Some(entry) if entry.live.is_none() => Some((
                    entry.id,
                    Arc::clone(&entry.source),
                    entry.spec.clone(),
                    Arc::clone(&entry.handler),
                )),
                _ => None,
            }
        };

        let Some((id, source, spec, handler)) = pending else {
            return Ok(());
        };

        let handler_id = source.connect(&spec, handler)?;

        let stale = {
            let mut entries = self.entries.lock();
            match entries.named.get_mut(name) {
                Some(entry) if entry.id == id && entry.live.is_none() => {
                    entry.live = Some(handler_id);
                    false
                }
                // Replaced, resumed or removed while we were registering.
                _ => true,
            }
        };

        if stale {
            detach(&source, handler_id, &spec);
        } else {
            tracing::debug!(name = %name, "Resumed named subscription");
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if `name` is known and currently paused.
    #[must_use]
    pub fn is_paused(&self, name: &str) -> bool {
        self.entries
            .lock()
            .named
            .get(name)
            .is_some_and(|entry| entry.live.is_none())
    }

    /// Returns `true` if `name` is known and currently connected.
    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.entries
            .lock()
            .named
            .get(name)
            .is_some_and(|entry| entry.live.is_some())
    }

    /// Returns the total number of subscriptions held, paused ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.lock();
        entries.anonymous.len() + entries.named.len()
    }

    /// Returns the number of named subscriptions, paused ones included.
    #[must_use]
    pub fn named_count(&self) -> usize {
        self.entries.lock().named.len()
    }

    /// Returns `true` if the registry holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tears down a single subscription by ID.
    ///
    /// Returns `true` if the subscription was found.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            if let Some(pos) = entries.anonymous.iter().position(|entry| entry.id == id) {
                Some(entries.anonymous.swap_remove(pos))
            } else {
                let name = entries
                    .named
                    .iter()
                    .find(|(_, entry)| entry.id == id)
                    .map(|(name, _)| name.clone());
                name.and_then(|name| entries.named.remove(&name))
            }
        };

        match removed {
            Some(entry) => {
                entry.teardown();
                true
            }
            None => false,
        }
    }

    /// Tears down every subscription, anonymous or named, attached to `source`.
    ///
    /// Sources are compared by identity. Calling this again, or for a source
    /// with no subscriptions, does nothing.
    pub fn disconnect_from<S>(&self, source: &S)
    where
        S: Observable + ?Sized,
    {
        let target = std::ptr::from_ref(source).cast::<()>();
        let removed: Vec<Entry> = {
            let mut entries = self.entries.lock();
            let (matching, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut entries.anonymous)
                .into_iter()
                .partition(|entry| entry.belongs_to(target));
            entries.anonymous = kept;

            let names: Vec<String> = entries
                .named
                .iter()
                .filter(|(_, entry)| entry.belongs_to(target))
                .map(|(name, _)| name.clone())
                .collect();
            matching
                .into_iter()
                .chain(names.iter().filter_map(|name| entries.named.remove(name)))
                .collect()
        };

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Disconnecting subscriptions from source");
        }
        removed.into_iter().for_each(Entry::teardown);
    }

    /// Tears down every subscription and clears all state.
    ///
    /// Safe to call any number of times.
    pub fn disconnect_all(&self) {
        let Entries { anonymous, named } = std::mem::take(&mut *self.entries.lock());

        let count = anonymous.len() + named.len();
        if count > 0 {
            tracing::debug!(count, "Disconnecting all subscriptions");
        }
        anonymous.into_iter().for_each(Entry::teardown);
        named.into_values().for_each(Entry::teardown);
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("SubscriptionRegistry")
            .field("anonymous", &entries.anonymous.len())
            .field("named", &entries.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, SignalError};
    use std::sync::atomic::AtomicU32;

    /// Minimal source that records its live handlers.
    #[derive(Default)]
    struct TestSource {
        next: AtomicU64,
        handlers: Mutex<Vec<(HandlerId, EventSpec, Handler)>>,
        reject: std::sync::atomic::AtomicBool,
        disconnects: AtomicU32,
    }

    impl TestSource {
        fn emit(&self, event: &EventSpec) {
            let matching: Vec<Handler> = self
                .handlers
                .lock()
                .iter()
                .filter(|(_, spec, _)| spec.matches(event))
                .map(|(_, _, handler)| Arc::clone(handler))
                .collect();
            for handler in matching {
                handler(event);
            }
        }

        fn live(&self) -> usize {
            self.handlers.lock().len()
        }
    }

    impl Observable for TestSource {
        fn connect(&self, spec: &EventSpec, handler: Handler) -> std::result::Result<HandlerId, SignalError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(SignalError::Rejected("test".to_string()));
            }
            let id = HandlerId::new(self.next.fetch_add(1, Ordering::SeqCst));
            self.handlers.lock().push((id, spec.clone(), handler));
            Ok(id)
        }

        fn disconnect(&self, id: HandlerId) -> std::result::Result<(), SignalError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            let mut handlers = self.handlers.lock();
            let before = handlers.len();
            handlers.retain(|(handler_id, _, _)| *handler_id != id);
            if handlers.len() == before {
                return Err(SignalError::UnknownHandler(id));
            }
            Ok(())
        }
    }

    fn counter() -> (Arc<AtomicU32>, impl Fn(&EventSpec) + Send + Sync + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let clone = Arc::clone(&count);
        (count, move |_: &EventSpec| {
            clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn changed() -> EventSpec {
        EventSpec::changed("color-scheme")
    }

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId::new(42).to_string(), "Sub(42)");
    }

    #[test]
    fn ids_follow_registration_order() {
        let registry = SubscriptionRegistry::new();
        let source: Source = Arc::new(TestSource::default());
        let first = registry.connect(source.clone(), changed(), |_| {}).unwrap();
        let second = registry.connect_named("x", source.clone(), changed(), |_| {}).unwrap();
        let third = registry.connect_named("x", source, changed(), |_| {}).unwrap();

        assert!(first < second && second < third);
        assert_eq!(first.value(), 1);
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = SubscriptionRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_paused("missing"));
        assert!(!registry.is_connected("missing"));
    }

    #[test]
    fn connect_dispatches_until_disconnected() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        let (count, handler) = counter();

        let id = registry.connect(source.clone(), changed(), handler).unwrap();
        source.emit(&changed());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(registry.disconnect(id));
        assert!(!registry.disconnect(id));
        source.emit(&changed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(source.live(), 0);
    }

    #[test]
    fn connect_propagates_registration_error() {
        let source = Arc::new(TestSource::default());
        source.reject.store(true, Ordering::SeqCst);
        let registry = SubscriptionRegistry::new();

        let result = registry.connect(source, changed(), |_| {});
        assert!(matches!(result, Err(Error::Signal(SignalError::Rejected(_)))));
        assert!(registry.is_empty());
    }

    #[test]
    fn connect_named_replaces_previous_handler() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        let (first, first_handler) = counter();
        let (second, second_handler) = counter();

        registry.connect_named("x", source.clone(), changed(), first_handler).unwrap();
        registry.connect_named("x", source.clone(), changed(), second_handler).unwrap();
        source.emit(&changed());

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(source.live(), 1);
        assert_eq!(registry.named_count(), 1);
    }

    #[test]
    fn failed_replacement_keeps_previous_handler() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        let (first, first_handler) = counter();

        let original = registry.connect_named("x", source.clone(), changed(), first_handler).unwrap();
        source.reject.store(true, Ordering::SeqCst);
        assert!(registry.connect_named("x", source.clone(), changed(), |_| {}).is_err());

        source.emit(&changed());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert!(registry.is_connected("x"));

        // The surviving entry is still the original one.
        assert!(registry.disconnect(original));
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        let (count, handler) = counter();

        let id = registry.connect_named("x", source.clone(), changed(), handler).unwrap();

        registry.pause("x");
        assert!(registry.is_paused("x"));
        assert!(!registry.is_connected("x"));
        source.emit(&changed());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        registry.resume("x").unwrap();
        registry.resume("x").unwrap();
        assert!(registry.is_connected("x"));
        source.emit(&changed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(source.live(), 1);

        // Same subscription, not a new one.
        assert!(registry.disconnect(id));
    }

    #[test]
    fn pause_is_noop_when_paused_or_unknown() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        registry.connect_named("x", source.clone(), changed(), |_| {}).unwrap();

        registry.pause("x");
        registry.pause("x");
        registry.pause("unknown");
        registry.resume("unknown").unwrap();

        assert_eq!(source.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_resume_stays_paused() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        registry.connect_named("x", source.clone(), changed(), |_| {}).unwrap();

        registry.pause("x");
        source.reject.store(true, Ordering::SeqCst);
        assert!(registry.resume("x").is_err());
        assert!(registry.is_paused("x"));
    }

    #[test]
    fn disconnect_from_only_touches_that_source() {
        let first = Arc::new(TestSource::default());
        let second = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();

        registry.connect(first.clone(), changed(), |_| {}).unwrap();
        registry.connect_named("a", first.clone(), changed(), |_| {}).unwrap();
        registry.connect_named("b", first.clone(), changed(), |_| {}).unwrap();
        registry.pause("b");
        registry.connect(second.clone(), changed(), |_| {}).unwrap();

        registry.disconnect_from(&*first);
        registry.disconnect_from(&*first);

        assert_eq!(first.live(), 0);
        assert_eq!(second.live(), 1);
        assert!(!registry.is_paused("b"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn disconnect_all_is_idempotent() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        let (count, handler) = counter();

        registry.connect(source.clone(), changed(), handler).unwrap();
        registry.connect_named("x", source.clone(), changed(), |_| {}).unwrap();

        registry.disconnect_all();
        registry.disconnect_all();
        source.emit(&changed());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
        assert_eq!(source.disconnects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn teardown_swallows_source_errors() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        registry.connect(source.clone(), changed(), |_| {}).unwrap();

        // The source forgets the handler behind the registry's back.
        source.handlers.lock().clear();
        registry.disconnect_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn drop_disconnects_everything() {
        let source = Arc::new(TestSource::default());
        {
            let registry = SubscriptionRegistry::new();
            registry.connect(source.clone(), changed(), |_| {}).unwrap();
            registry.connect_named("x", source.clone(), changed(), |_| {}).unwrap();
        }
        assert_eq!(source.live(), 0);
    }

    #[test]
    fn registry_debug() {
        let source = Arc::new(TestSource::default());
        let registry = SubscriptionRegistry::new();
        registry.connect_named("manual-change", source, changed(), |_| {}).unwrap();

        let debug = format!("{registry:?}");
        assert!(debug.contains("SubscriptionRegistry"));
        assert!(debug.contains("manual-change"));
    }
}
