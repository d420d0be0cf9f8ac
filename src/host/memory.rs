// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory settings store.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::SettingsStore;
use super::listeners::Listeners;
use crate::error::{Result, SettingsError, SignalError};
use crate::subscription::{EventSpec, Handler, HandlerId, Observable};

/// Signal emitted on every write.
const CHANGED: &str = "changed";

/// A value held by [`MemorySettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean setting.
    Bool(bool),
    /// String setting.
    String(String),
}

impl SettingValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
        }
    }
}

/// Settings store kept in memory.
///
/// The set of keys and their types is fixed when the store is built; reading
/// or writing any other key fails with [`SettingsError::UnknownKey`], as a
/// schema-backed store would. Every successful write emits
/// `changed::<key>` synchronously, after the store's own locks are released.
///
/// # Examples
///
/// ```
/// use duskswitch_lib::host::{MemorySettings, SettingsStore};
///
/// let settings = MemorySettings::from_json(r#"{
///     "enable-theme-timers": true,
///     "sunrise-time": "07:00",
///     "sunset-time": "19:00"
/// }"#).unwrap();
///
/// assert!(settings.get_bool("enable-theme-timers").unwrap());
/// settings.set_string("sunset-time", "20:30").unwrap();
/// assert_eq!(settings.get_string("sunset-time").unwrap(), "20:30");
/// assert!(settings.get_string("missing").is_err());
/// ```
pub struct MemorySettings {
    values: RwLock<HashMap<String, SettingValue>>,
    listeners: Listeners,
}

impl MemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            listeners: Listeners::new(),
        }
    }

    /// Creates a store from a JSON object of booleans and strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the input is not such
    /// an object.
    pub fn from_json(json: &str) -> Result<Self> {
        let values: HashMap<String, SettingValue> = serde_json::from_str(json)?;
        Ok(Self {
            values: RwLock::new(values),
            listeners: Listeners::new(),
        })
    }

    /// Declares a boolean key with its initial value.
    #[must_use]
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.values.write().insert(key.into(), SettingValue::Bool(value));
        self
    }

    /// Declares a string key with its initial value.
    #[must_use]
    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .write()
            .insert(key.into(), SettingValue::String(value.into()));
        self
    }

    /// Returns a copy of every key and value.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, SettingValue> {
        self.values.read().clone()
    }

    /// Returns the number of connected listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn write(&self, key: &str, value: SettingValue) -> std::result::Result<(), SettingsError> {
        {
            let mut values = self.values.write();
            let slot = values
                .get_mut(key)
                .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
            if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
                return Err(SettingsError::TypeMismatch {
                    key: key.to_string(),
                    expected: value.type_name(),
                });
            }
            *slot = value;
        }

        tracing::trace!(key = %key, "Setting written");
        self.listeners.emit(&EventSpec::changed(key));
        Ok(())
    }
}

impl SettingsStore for MemorySettings {
    fn get_bool(&self, key: &str) -> std::result::Result<bool, SettingsError> {
        match self.values.read().get(key) {
            Some(SettingValue::Bool(value)) => Ok(*value),
            Some(SettingValue::String(_)) => Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
            }),
            None => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }

    fn get_string(&self, key: &str) -> std::result::Result<String, SettingsError> {
        match self.values.read().get(key) {
            Some(SettingValue::String(value)) => Ok(value.clone()),
            Some(SettingValue::Bool(_)) => Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
            None => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> std::result::Result<(), SettingsError> {
        self.write(key, SettingValue::Bool(value))
    }

    fn set_string(&self, key: &str, value: &str) -> std::result::Result<(), SettingsError> {
        self.write(key, SettingValue::String(value.to_string()))
    }
}

impl Observable for MemorySettings {
    fn connect(&self, spec: &EventSpec, handler: Handler) -> std::result::Result<HandlerId, SignalError> {
        let known_key = spec
            .detail()
            .is_none_or(|key| self.values.read().contains_key(key));
        if spec.signal() != CHANGED || !known_key {
            return Err(SignalError::UnknownSignal(spec.to_string()));
        }
        Ok(self.listeners.add(spec, handler))
    }

    fn disconnect(&self, id: HandlerId) -> std::result::Result<(), SignalError> {
        self.listeners.remove(id)
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemorySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySettings")
            .field("values", &*self.values.read())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn store() -> MemorySettings {
        MemorySettings::new()
            .with_bool("enable-theme-timers", true)
            .with_string("color-scheme", "default")
    }

    #[test]
    fn reads_declared_values() {
        let settings = store();
        assert!(settings.get_bool("enable-theme-timers").unwrap());
        assert_eq!(settings.get_string("color-scheme").unwrap(), "default");
    }

    #[test]
    fn unknown_key_is_an_error() {
        let settings = store();
        assert_eq!(
            settings.get_string("sunrise-time"),
            Err(SettingsError::UnknownKey("sunrise-time".to_string()))
        );
        assert!(settings.set_string("sunrise-time", "07:00").is_err());
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let settings = store();
        assert!(matches!(
            settings.get_bool("color-scheme"),
            Err(SettingsError::TypeMismatch { expected: "bool", .. })
        ));
        assert!(settings.set_bool("color-scheme", true).is_err());
        assert_eq!(settings.get_string("color-scheme").unwrap(), "default");
    }

    #[test]
    fn write_notifies_matching_listeners() {
        let settings = store();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        settings
            .connect(
                &EventSpec::changed("color-scheme"),
                Arc::new(move |_: &EventSpec| {
                    count_clone.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        settings.set_string("color-scheme", "prefer-dark").unwrap();
        settings.set_bool("enable-theme-timers", false).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_read_back_during_dispatch() {
        let settings = Arc::new(store());
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let (store_clone, seen_clone) = (Arc::clone(&settings), Arc::clone(&seen));

        settings
            .connect(
                &EventSpec::new("changed"),
                Arc::new(move |_: &EventSpec| {
                    *seen_clone.lock() = store_clone.get_string("color-scheme").ok();
                }),
            )
            .unwrap();

        settings.set_string("color-scheme", "prefer-dark").unwrap();
        assert_eq!(seen.lock().as_deref(), Some("prefer-dark"));
    }

    #[test]
    fn connect_rejects_unknown_signal_or_key() {
        let settings = store();
        let noop: Handler = Arc::new(|_: &EventSpec| {});

        assert!(settings.connect(&EventSpec::new("notify"), Arc::clone(&noop)).is_err());
        assert!(settings.connect(&EventSpec::changed("missing"), noop).is_err());
    }

    #[test]
    fn disconnect_unknown_handler() {
        let settings = store();
        assert_eq!(
            settings.disconnect(HandlerId::new(99)),
            Err(SignalError::UnknownHandler(HandlerId::new(99)))
        );
    }

    #[test]
    fn from_json_rejects_nested_values() {
        assert!(MemorySettings::from_json(r#"{"a": {"b": 1}}"#).is_err());
        assert!(MemorySettings::from_json(r#"{"a": 1}"#).is_err());
    }
}
