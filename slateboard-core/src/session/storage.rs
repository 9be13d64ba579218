/*
    storage.rs - Session-scoped storage capability

    The client session id must survive a reload within the same tab but
    not across tabs. The storage backend is an injected capability so
    the core logic is testable without a real browser storage layer;
    absence of storage degrades to a fresh identifier, never an error.
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Key under which the client session id is persisted
const CLIENT_ID_KEY: &str = "clientId";

/// Session-scoped key/value storage
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("storage lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().expect("storage lock poisoned").remove(key);
    }
}

/// Storage backend for environments with no session storage at all.
/// Every lookup misses, so each session gets a fresh identifier.
#[derive(Debug, Default)]
pub struct NullSessionStorage;

impl SessionStorage for NullSessionStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

/// Random per-session identifier used to namespace locally created
/// element identifiers, so two clients creating elements concurrently
/// never collide. Collision avoidance only; it provides no field-level
/// merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSessionId(String);

impl ClientSessionId {
    /// Generate a fresh identifier without persisting it
    pub fn generate() -> Self {
        ClientSessionId(Uuid::new_v4().to_string())
    }

    /// Load the persisted identifier, or generate and persist a new one
    pub fn load_or_generate(storage: &dyn SessionStorage) -> Self {
        if let Some(existing) = storage.get(CLIENT_ID_KEY) {
            return ClientSessionId(existing);
        }
        let id = Self::generate();
        storage.set(CLIENT_ID_KEY, &id.0);
        id
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix applied to locally created element identifiers
    pub fn element_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl fmt::Display for ClientSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_generate_persists_id() {
        let storage = MemorySessionStorage::new();
        let first = ClientSessionId::load_or_generate(&storage);
        let second = ClientSessionId::load_or_generate(&storage);
        assert_eq!(first, second);
    }

    #[test]
    fn test_null_storage_yields_fresh_id_each_session() {
        let storage = NullSessionStorage;
        let first = ClientSessionId::load_or_generate(&storage);
        let second = ClientSessionId::load_or_generate(&storage);
        assert_ne!(first, second);
    }

    #[test]
    fn test_generated_id_is_uuid_shaped() {
        let id = ClientSessionId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert_eq!(id.as_str().matches('-').count(), 4);
    }

    #[test]
    fn test_element_prefix_ends_with_underscore() {
        let id = ClientSessionId::generate();
        assert!(id.element_prefix().ends_with('_'));
        assert!(id.element_prefix().starts_with(id.as_str()));
    }

    #[test]
    fn test_memory_storage_remove() {
        let storage = MemorySessionStorage::new();
        storage.set("k", "v");
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        storage.remove("k");
        assert!(storage.get("k").is_none());
    }
}
