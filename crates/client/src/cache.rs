//! Response cache keyed by request path.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use telemed_core::Resource;

/// Cached list responses. Keys are request paths relative to the API base, such as
/// `appointments/` or `users/?is_doctor=true`; a resource owns every key under its path.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<String, Value>>,
}

fn belongs_to(key: &str, resource: Resource) -> bool {
    key.strip_prefix(resource.path())
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().ok()?;
        let value = entries.get(key)?;
        T::deserialize(value).ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_owned(), value);
        }
    }

    /// Drops every entry under `resource`.
    pub fn invalidate(&self, resource: Resource) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|key, _| !belongs_to(key, resource));
        }
        tracing::debug!(%resource, "cache invalidated");
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
