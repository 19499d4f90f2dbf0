//! Secure credential handling for AI backends.
//!
//! All backends hold their API key in an [`ApiCredential`], which:
//!
//! - Cannot appear in `Debug` or `Display` output
//! - Is zeroed on drop via the `secrecy` crate
//! - Must be explicitly exposed with `.expose()` at the point of use
//! - Tracks where the value came from, for diagnosing configuration
//!   issues without revealing the value

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use scrawl_core::config::{credential_key, ConfigStore};
use scrawl_core::types::BackendKind;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from the host settings store
    Settings,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Settings => write!(f, "settings"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// An empty credential is valid and means "unconfigured"; backends report
/// `is_configured() == false` in that case rather than erroring at load.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value. The value cannot be accidentally logged
    /// after this point.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a backend's credential from the settings store. A missing key
    /// yields an empty (unconfigured) credential.
    pub fn from_store(store: &dyn ConfigStore, kind: BackendKind, name: &'static str) -> Self {
        let value = store.get_string(&credential_key(kind), "");
        Self::new(value, CredentialSource::Settings, name)
    }

    /// Expose the credential value for use in an HTTP header.
    ///
    /// Only call this at the point where the credential is actually
    /// needed; never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
