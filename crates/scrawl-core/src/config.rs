//! Key-value settings store abstraction.
//!
//! The host application owns a persistent settings store; the assistant
//! only reads and writes a handful of namespaced keys through this trait.
//! An in-memory implementation is provided for tests and embedding without
//! a host store.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::BackendKind;

/// Settings key holding the active backend name.
pub const CURRENT_BACKEND_KEY: &str = "ai_current_provider";

/// Settings key holding the filter level name.
pub const FILTER_LEVEL_KEY: &str = "ai_filter_level";

/// Settings key holding the retrieval-filtering flag.
pub const RAG_FILTERING_KEY: &str = "ai_enable_rag_filtering";

/// Settings key for a backend's API credential.
pub fn credential_key(kind: BackendKind) -> String {
    format!("ai_{}_apikey", kind.config_name())
}

/// Settings key for a backend's base endpoint URL.
pub fn base_url_key(kind: BackendKind) -> String {
    format!("ai_{}_baseurl", kind.config_name())
}

/// Host-owned persistent key-value settings.
///
/// Implementations must be usable from multiple threads; the assistant
/// calls these from async tasks.
pub trait ConfigStore: Send + Sync {
    /// Read a string value, returning `default` when the key is absent.
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Write a string value.
    fn set_string(&self, key: &str, value: &str);

    /// Read a boolean value, returning `default` when the key is absent.
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Write a boolean value.
    fn set_bool(&self, key: &str, value: bool);
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from key-value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .expect("config store lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set_string(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("config store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self
            .values
            .lock()
            .expect("config store lock poisoned")
            .get(key)
            .map(String::as_str)
        {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            _ => default,
        }
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set_string(key, if value { "true" } else { "false" });
    }
}
