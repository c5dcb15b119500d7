//! Persisted option store consumed by the provider layer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::warn;

/// Key/value configuration store owned by the host application.
///
/// The provider layer only reads credentials from it, and writes the
/// GitHub "last refresh" marker.
pub trait SettingsStore: Send + Sync {
    /// Get a single setting value by key.
    fn get_setting(&self, key: &str) -> Option<String>;

    /// Insert or replace a single setting.
    fn set_setting(&self, key: &str, value: &str);
}

/// In-process [`SettingsStore`].
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from key/value pairs.
    pub fn with_values<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: Mutex::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| {
            warn!("Settings mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SettingsStore for MemorySettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_setting(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }
}
