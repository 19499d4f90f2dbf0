//! Registry of configured backends and the active-kind selection.
//!
//! The registry is rebuilt from a [`ConfigStore`] at startup: each built-in
//! kind is instantiated from its persisted credential and base URL, and
//! only configured instances are kept. Gemini is a recognized kind with no
//! built-in wire implementation, so it never appears unless supplied
//! through the custom slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use scrawl_core::config::{self, ConfigStore, CURRENT_BACKEND_KEY};
use scrawl_core::types::BackendKind;

use crate::providers::{AnthropicBackend, Backend, OllamaBackend, OpenAiBackend};
use crate::transport::HttpTransport;

pub struct BackendRegistry {
    store: Arc<dyn ConfigStore>,
    transport: Arc<dyn HttpTransport>,
    backends: BTreeMap<BackendKind, Arc<dyn Backend>>,
    active: BackendKind,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.available())
            .field("active", &self.active)
            .finish()
    }
}

impl BackendRegistry {
    /// Build the registry from persisted settings.
    ///
    /// Ollama defaults its base URL and is therefore always present; the
    /// keyed kinds are present only when a credential is stored.
    pub fn from_store(store: Arc<dyn ConfigStore>, transport: Arc<dyn HttpTransport>) -> Self {
        let mut backends = BTreeMap::new();
        for kind in BackendKind::BUILT_IN {
            let api_key = store.get_string(&config::credential_key(kind), "");
            let base_url = store.get_string(&config::base_url_key(kind), "");
            if let Some(backend) = build_backend(kind, &api_key, &base_url, transport.clone()) {
                if backend.is_configured() {
                    info!(backend = backend.name(), "backend configured");
                    backends.insert(kind, backend);
                }
            }
        }

        let active = BackendKind::from_config_name(&store.get_string(CURRENT_BACKEND_KEY, ""));

        Self {
            store,
            transport,
            backends,
            active,
        }
    }

    /// The persisted active kind, whether or not it is present.
    pub fn active_kind(&self) -> BackendKind {
        self.active
    }

    /// The active backend, if it is present and configured.
    pub fn active_backend(&self) -> Option<Arc<dyn Backend>> {
        self.backends
            .get(&self.active)
            .filter(|b| b.is_configured())
            .cloned()
    }

    /// Switch the active kind. Refused (returning `false`) unless the
    /// target is present and configured; a successful switch is persisted.
    pub fn switch_active(&mut self, kind: BackendKind) -> bool {
        match self.backends.get(&kind) {
            Some(backend) if backend.is_configured() => {
                self.active = kind;
                self.store.set_string(CURRENT_BACKEND_KEY, kind.config_name());
                info!(backend = kind.config_name(), "active backend switched");
                true
            }
            _ => false,
        }
    }

    /// Persist credentials for `kind` and rebuild that one backend.
    ///
    /// The active kind is left untouched; callers opt in to a switch with
    /// [`switch_active`](Self::switch_active). For kinds without a built-in
    /// implementation only the settings are written.
    pub fn configure(&mut self, kind: BackendKind, api_key: &str, base_url: &str) {
        self.store.set_string(&config::credential_key(kind), api_key);
        self.store.set_string(&config::base_url_key(kind), base_url);

        if let Some(backend) = build_backend(kind, api_key, base_url, self.transport.clone()) {
            if backend.is_configured() {
                self.backends.insert(kind, backend);
            } else {
                self.backends.remove(&kind);
            }
        }
    }

    /// Install a caller-supplied backend in the custom slot.
    pub fn add_custom(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(BackendKind::Custom, backend);
    }

    /// Names of the present, configured backends in kind order.
    pub fn available(&self) -> Vec<String> {
        self.backends
            .values()
            .filter(|b| b.is_configured())
            .map(|b| b.name().to_string())
            .collect()
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }
}

fn build_backend(
    kind: BackendKind,
    api_key: &str,
    base_url: &str,
    transport: Arc<dyn HttpTransport>,
) -> Option<Arc<dyn Backend>> {
    match kind {
        BackendKind::OpenAi => Some(Arc::new(OpenAiBackend::new(api_key, base_url, transport))),
        BackendKind::Anthropic => {
            Some(Arc::new(AnthropicBackend::new(api_key, base_url, transport)))
        }
        BackendKind::Ollama => Some(Arc::new(OllamaBackend::new(base_url, transport))),
        // No built-in implementations; present only via the custom slot.
        BackendKind::Gemini | BackendKind::Custom => None,
    }
}
