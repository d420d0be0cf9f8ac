// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the subscription registry against the bundled
//! in-memory sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use duskswitch_lib::host::{MemorySettings, STARTUP_COMPLETE, SettingsStore, StartupSignal};
use duskswitch_lib::subscription::{EventSpec, SubscriptionRegistry};
use duskswitch_lib::{Error, SignalError};

fn store() -> Arc<MemorySettings> {
    Arc::new(
        MemorySettings::new()
            .with_string("color-scheme", "default")
            .with_bool("enable-theme-timers", true),
    )
}

fn counter() -> (Arc<AtomicU32>, impl Fn(&EventSpec) + Send + Sync + 'static) {
    let count = Arc::new(AtomicU32::new(0));
    let clone = Arc::clone(&count);
    (count, move |_: &EventSpec| {
        clone.fetch_add(1, Ordering::SeqCst);
    })
}

// ============================================================================
// Teardown
// ============================================================================

mod teardown {
    use super::*;

    #[test]
    fn disconnect_all_is_idempotent() {
        let settings = store();
        let startup = Arc::new(StartupSignal::new());
        let registry = SubscriptionRegistry::new();
        let (count, handler) = counter();
        let handler = Arc::new(handler);

        for spec in ["changed::color-scheme", "changed::enable-theme-timers"] {
            let handler = Arc::clone(&handler);
            registry
                .connect(settings.clone(), spec, move |event| (*handler)(event))
                .unwrap();
        }
        let on_startup = Arc::clone(&handler);
        registry
            .connect_named("startup", startup.clone(), STARTUP_COMPLETE, move |event| {
                (*on_startup)(event);
            })
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(settings.listener_count(), 2);

        registry.disconnect_all();
        registry.disconnect_all();

        assert!(registry.is_empty());
        assert_eq!(settings.listener_count(), 0);
        settings.set_string("color-scheme", "prefer-dark").unwrap();
        startup.complete();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disconnect_only_removes_that_subscription() {
        let settings = store();
        let registry = SubscriptionRegistry::new();
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        let first_id = registry
            .connect(settings.clone(), "changed::color-scheme", first)
            .unwrap();
        registry
            .connect(settings.clone(), "changed::color-scheme", second)
            .unwrap();

        assert!(registry.disconnect(first_id));
        assert!(!registry.disconnect(first_id));

        settings.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disconnect_from_keeps_other_sources() {
        let settings = store();
        let interface = store();
        let registry = SubscriptionRegistry::new();
        let (settings_count, on_settings) = counter();
        let (interface_count, on_interface) = counter();

        registry
            .connect(settings.clone(), "changed", on_settings)
            .unwrap();
        registry
            .connect_named("manual-change", interface.clone(), "changed::color-scheme", on_interface)
            .unwrap();

        registry.disconnect_from(interface.as_ref());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.named_count(), 0);

        settings.set_bool("enable-theme-timers", false).unwrap();
        interface.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(settings_count.load(Ordering::SeqCst), 1);
        assert_eq!(interface_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_registry_detaches_handlers() {
        let settings = store();
        let (count, handler) = counter();
        {
            let registry = SubscriptionRegistry::new();
            registry
                .connect(settings.clone(), "changed::color-scheme", handler)
                .unwrap();
            assert_eq!(settings.listener_count(), 1);
        }

        assert_eq!(settings.listener_count(), 0);
        settings.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Named subscriptions
// ============================================================================

mod named {
    use super::*;

    #[test]
    fn reconnecting_a_name_replaces_the_handler() {
        let interface = store();
        let registry = SubscriptionRegistry::new();
        let (old_count, old) = counter();
        let (new_count, new) = counter();

        let old_id = registry
            .connect_named("manual-change", interface.clone(), "changed::color-scheme", old)
            .unwrap();
        let new_id = registry
            .connect_named("manual-change", interface.clone(), "changed::color-scheme", new)
            .unwrap();
        assert_ne!(old_id, new_id);
        assert_eq!(registry.named_count(), 1);
        assert_eq!(interface.listener_count(), 1);

        interface.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(old_count.load(Ordering::SeqCst), 0);
        assert_eq!(new_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pause_resume_round_trip() {
        let interface = store();
        let registry = SubscriptionRegistry::new();
        let (count, handler) = counter();

        registry
            .connect_named("manual-change", interface.clone(), "changed::color-scheme", handler)
            .unwrap();

        registry.pause("manual-change");
        assert!(registry.is_paused("manual-change"));
        assert_eq!(interface.listener_count(), 0);
        interface.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        registry.resume("manual-change").unwrap();
        assert!(registry.is_connected("manual-change"));
        interface.set_string("color-scheme", "default").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Resuming a live subscription does not register it twice.
        registry.resume("manual-change").unwrap();
        assert_eq!(interface.listener_count(), 1);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let registry = SubscriptionRegistry::new();
        registry.pause("missing");
        registry.resume("missing").unwrap();
        assert!(!registry.is_paused("missing"));
        assert!(!registry.is_connected("missing"));
    }

    #[test]
    fn paused_subscription_is_torn_down_by_disconnect_all() {
        let interface = store();
        let registry = SubscriptionRegistry::new();
        let (_count, handler) = counter();

        registry
            .connect_named("manual-change", interface.clone(), "changed::color-scheme", handler)
            .unwrap();
        registry.pause("manual-change");
        registry.disconnect_all();

        registry.resume("manual-change").unwrap();
        assert_eq!(interface.listener_count(), 0);
        assert!(registry.is_empty());
    }
}

// ============================================================================
// Registration errors
// ============================================================================

mod registration_errors {
    use super::*;

    #[test]
    fn unknown_signal_is_reported() {
        let startup = Arc::new(StartupSignal::new());
        let registry = SubscriptionRegistry::new();
        let (_count, handler) = counter();

        let result = registry.connect(startup, "shutdown", handler);
        assert!(matches!(
            result,
            Err(Error::Signal(SignalError::UnknownSignal(_)))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_setting_key_is_reported() {
        let settings = store();
        let registry = SubscriptionRegistry::new();
        let (_count, handler) = counter();

        let result = registry.connect_named("named", settings.clone(), "changed::sunset-time", handler);
        assert!(result.is_err());
        assert_eq!(registry.named_count(), 0);
        assert_eq!(settings.listener_count(), 0);
    }
}
