//! Connection settings
//!
//! [`ConnectionSettings`] is the flat key/value map the broker reads its
//! connection strings from. It can be assembled from the environment, from a
//! JSON file, or both layered together.

use crate::error::BrokerResult;
use crate::kind::{GENERIC_CONNECTION_STRING_KEY, ResourceKind};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix shared by every setting the broker reads.
pub const SETTING_PREFIX: &str = "ResourceBroker";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only map of setting name to value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSettings(BTreeMap<String, String>);

impl ConnectionSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects `ResourceBroker*` settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Keeps the `ResourceBroker*` pairs of `vars`.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        vars.into_iter().filter(|(k, _)| k.starts_with(SETTING_PREFIX)).collect()
    }

    /// Reads a JSON object of string values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a JSON object of
    /// strings.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Layers `other` over `self`; keys present in both take `other`'s value.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get) but treats blank values as absent.
    #[must_use]
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Values are connection strings, so only the keys are printed.
impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Two-tier connection string lookup shared by every broker.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageCredentialResolver;

impl StorageCredentialResolver {
    /// Returns the kind-specific connection string if set and non-blank,
    /// else the generic one.
    ///
    /// ```
    /// use sas_broker::{ConnectionSettings, ResourceKind, StorageCredentialResolver};
    ///
    /// let settings: ConnectionSettings = [
    ///     ("ResourceBrokerStorageConnectionString", "generic"),
    ///     ("ResourceBrokerQueueConnectionString", "queue"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// assert_eq!(StorageCredentialResolver::resolve(ResourceKind::Queue, &settings).unwrap(), "queue");
    /// assert_eq!(StorageCredentialResolver::resolve(ResourceKind::Blob, &settings).unwrap(), "generic");
    /// ```
    ///
    /// # Errors
    /// Returns `ConfigurationMissing` if neither setting is usable.
    pub fn resolve(kind: ResourceKind, settings: &ConnectionSettings) -> BrokerResult<String> {
        let specific = kind.connection_string_key();
        if let Some(cs) = settings.get_non_blank(specific) {
            debug!(%kind, key = specific, "connection string resolved");
            return Ok(cs.to_owned());
        }
        if let Some(cs) = settings.get_non_blank(GENERIC_CONNECTION_STRING_KEY) {
            debug!(%kind, key = GENERIC_CONNECTION_STRING_KEY, "connection string resolved");
            return Ok(cs.to_owned());
        }
        Err(broker_error!(
            ConfigurationMissing,
            "neither {} nor {} is configured",
            specific,
            GENERIC_CONNECTION_STRING_KEY
        ))
    }
}

/// Source of [`ConnectionSettings`] snapshots.
pub trait SettingsProvider: Send + Sync + 'static {
    fn snapshot(&self) -> Arc<ConnectionSettings>;
}

#[derive(Debug, Default)]
pub struct StaticSettingsProvider {
    inner: Arc<ConnectionSettings>,
}

impl StaticSettingsProvider {
    #[must_use]
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self { inner: settings }
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn snapshot(&self) -> Arc<ConnectionSettings> {
        Arc::clone(&self.inner)
    }
}

/// Settings that can be replaced while the host keeps running.
#[derive(Debug)]
pub struct HotReloadSettingsProvider {
    inner: ArcSwap<ConnectionSettings>,
}

impl HotReloadSettingsProvider {
    #[must_use]
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self {
            inner: ArcSwap::from(settings),
        }
    }

    pub fn update(&self, settings: Arc<ConnectionSettings>) {
        self.inner.store(settings);
    }
}

impl Default for HotReloadSettingsProvider {
    fn default() -> Self {
        Self::new(Arc::new(ConnectionSettings::default()))
    }
}

impl SettingsProvider for HotReloadSettingsProvider {
    fn snapshot(&self) -> Arc<ConnectionSettings> {
        self.inner.load_full()
    }
}
