//! Resource type registry

use crate::broker::{BlobBroker, QueueBroker, ResourceBroker, TableBroker};
use crate::config::BrokerConfigProvider;
use crate::error::BrokerResult;
use crate::kind::ResourceKind;
use crate::signer::AccessSigner;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps resource type tokens to brokers.
#[derive(Default, Clone)]
pub struct ResourceTypeRegistry {
    brokers: HashMap<ResourceKind, Arc<dyn ResourceBroker>>,
}

impl ResourceTypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob, table and queue brokers sharing one signer and configuration.
    #[must_use]
    pub fn with_defaults(signer: Arc<dyn AccessSigner>, config: Arc<dyn BrokerConfigProvider>) -> Self {
        let mut this = Self::new();
        this.register(BlobBroker::new(Arc::clone(&signer), Arc::clone(&config)));
        this.register(TableBroker::new(Arc::clone(&signer), Arc::clone(&config)));
        this.register(QueueBroker::new(signer, config));
        this
    }

    /// Registers `broker` under its kind, replacing any previous one.
    pub fn register(&mut self, broker: impl ResourceBroker) {
        self.brokers.insert(broker.kind(), Arc::new(broker));
    }

    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&Arc<dyn ResourceBroker>> {
        self.brokers.get(&kind)
    }

    /// Finds the broker for a case-insensitive type token.
    ///
    /// # Errors
    /// Returns `UnknownResourceType` if the token names no registered kind.
    pub fn lookup(&self, token: &str) -> BrokerResult<&Arc<dyn ResourceBroker>> {
        ResourceKind::from_token(token)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| broker_error!(UnknownResourceType, "unknown resource type: {}", token))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.brokers.keys().copied()
    }
}

impl fmt::Debug for ResourceTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds().collect();
        kinds.sort();
        f.debug_struct("ResourceTypeRegistry").field("kinds", &kinds).finish()
    }
}
