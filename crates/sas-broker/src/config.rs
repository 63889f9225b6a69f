//! Broker Configuration
//!
//! This module provides the tunables used while issuing tokens.
//!
//! # Features
//! - `serde` support for serialization/deserialization
//! - Default values for all parameters
//! - Static configuration via [`StaticConfigProvider`]
//! - Hot-reload configuration via [`HotReloadConfigProvider`]
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use sas_broker::config::{BrokerConfig, BrokerConfigProvider, HotReloadConfigProvider};
//!
//! let provider = Arc::new(HotReloadConfigProvider::default());
//! assert_eq!(provider.snapshot().clock_skew_secs, 300);
//!
//! let mut config = BrokerConfig::default();
//! config.https_only = true;
//! provider.update(Arc::new(config));
//! assert!(provider.snapshot().https_only);
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use time::Duration;

/// Signed storage service version put into every token.
pub const DEFAULT_SIGNED_VERSION: &str = "2015-04-05";

/// Source of [`BrokerConfig`] snapshots.
///
/// A snapshot is taken once per token so that every value used while signing
/// comes from the same configuration.
pub trait BrokerConfigProvider: Send + Sync + 'static {
    fn snapshot(&self) -> Arc<BrokerConfig>;
}

/// Broker Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct BrokerConfig {
    /// How far before "now" a token becomes valid, in seconds.
    ///
    /// Covers clock differences between the broker and the storage service.
    ///
    /// Default: 300 (5 minutes)
    pub clock_skew_secs: u32,

    /// Storage service version (`sv`) the signature is computed for.
    ///
    /// Default: `2015-04-05`
    pub signed_version: String,

    /// Restrict tokens to HTTPS (`spr=https`).
    ///
    /// Default: false
    pub https_only: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            clock_skew_secs: 300, // 5 minutes
            signed_version: DEFAULT_SIGNED_VERSION.to_owned(),
            https_only: false,
        }
    }
}

impl BrokerConfig {
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        Duration::seconds(i64::from(self.clock_skew_secs))
    }

    /// The `spr` value, if any.
    #[must_use]
    pub fn protocol(&self) -> Option<&'static str> {
        self.https_only.then_some("https")
    }
}

/// Static configuration provider.
#[derive(Debug)]
pub struct StaticConfigProvider {
    inner: Arc<BrokerConfig>,
}

impl StaticConfigProvider {
    #[must_use]
    pub fn new(config: Arc<BrokerConfig>) -> Self {
        Self { inner: config }
    }
}

impl Default for StaticConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(BrokerConfig::default()))
    }
}

impl BrokerConfigProvider for StaticConfigProvider {
    fn snapshot(&self) -> Arc<BrokerConfig> {
        Arc::clone(&self.inner)
    }
}

/// Hot-reload configuration provider.
///
/// Reads are lock-free; [`update`](Self::update) swaps the whole configuration
/// atomically.
#[derive(Debug)]
pub struct HotReloadConfigProvider {
    inner: ArcSwap<BrokerConfig>,
}

impl HotReloadConfigProvider {
    #[must_use]
    pub fn new(config: Arc<BrokerConfig>) -> Self {
        Self {
            inner: ArcSwap::from(config),
        }
    }

    pub fn update(&self, config: Arc<BrokerConfig>) {
        self.inner.store(config);
    }
}

impl Default for HotReloadConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(BrokerConfig::default()))
    }
}

impl BrokerConfigProvider for HotReloadConfigProvider {
    fn snapshot(&self) -> Arc<BrokerConfig> {
        self.inner.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert_eq!(config.clock_skew_secs, 300);
        assert_eq!(config.signed_version, "2015-04-05");
        assert_eq!(config.https_only, false);
        assert_eq!(config.clock_skew(), Duration::minutes(5));
        assert_eq!(config.protocol(), None);
    }

    #[test]
    fn test_serde_partial() {
        let config: BrokerConfig = serde_json::from_str(r#"{"https_only": true}"#).unwrap();
        assert!(config.https_only);
        assert_eq!(config.clock_skew_secs, 300);
        assert_eq!(config.protocol(), Some("https"));
    }

    #[test]
    fn test_static_provider() {
        let config = BrokerConfig {
            clock_skew_secs: 60,
            ..BrokerConfig::default()
        };
        let provider = StaticConfigProvider::new(Arc::new(config));
        assert_eq!(provider.snapshot().clock_skew_secs, 60);
    }

    #[test]
    fn test_hot_reload_provider() {
        let provider = HotReloadConfigProvider::default();
        let before = provider.snapshot();

        let config = BrokerConfig {
            signed_version: "2020-12-06".to_owned(),
            ..BrokerConfig::default()
        };
        provider.update(Arc::new(config));

        assert_eq!(before.signed_version, "2015-04-05");
        assert_eq!(provider.snapshot().signed_version, "2020-12-06");
    }

    #[test]
    fn test_provider_trait_object() {
        let provider: Arc<dyn BrokerConfigProvider> = Arc::new(StaticConfigProvider::default());
        assert_eq!(*provider.snapshot(), BrokerConfig::default());
    }
}
