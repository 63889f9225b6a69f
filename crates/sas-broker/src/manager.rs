//! Resource request manager
//!
//! The single entry point a host calls. A request moves through
//! `received -> type resolved -> parameters validated -> connection string
//! resolved -> token issued`, and stops at the first failure.

use crate::broker::ResourceBroker;
use crate::config::{BrokerConfigProvider, StaticConfigProvider};
use crate::error::BrokerResult;
use crate::kind::ResourceKind;
use crate::params::ResourceParameters;
use crate::registry::ResourceTypeRegistry;
use crate::settings::ConnectionSettings;
use crate::signer::{AccessSigner, SharedKeySigner};
use crate::token::ResourceToken;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

/// Where the storage credential comes from.
#[derive(Clone, Copy)]
pub enum CredentialSource<'a> {
    /// Use this connection string directly.
    ConnectionString(&'a str),
    /// Resolve from settings, kind-specific key first.
    Settings(&'a ConnectionSettings),
}

impl std::fmt::Debug for CredentialSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionString(_) => f.write_str("ConnectionString(<redacted>)"),
            Self::Settings(s) => f.debug_tuple("Settings").field(s).finish(),
        }
    }
}

/// A request whose type and parameters have been validated.
#[derive(Clone)]
pub struct ValidatedRequest {
    broker: Arc<dyn ResourceBroker>,
    parameters: ResourceParameters,
}

impl ValidatedRequest {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.broker.kind()
    }

    #[must_use]
    pub fn parameters(&self) -> &ResourceParameters {
        &self.parameters
    }
}

impl std::fmt::Debug for ValidatedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedRequest")
            .field("kind", &self.kind())
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Turns resource requests into signed tokens.
#[derive(Debug, Clone)]
pub struct ResourceRequestManager {
    registry: Arc<ResourceTypeRegistry>,
}

impl Default for ResourceRequestManager {
    fn default() -> Self {
        Self::with_config(Arc::new(StaticConfigProvider::default()))
    }
}

impl ResourceRequestManager {
    #[must_use]
    pub fn new(registry: ResourceTypeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Default brokers signing with the account key under `config`.
    #[must_use]
    pub fn with_config(config: Arc<dyn BrokerConfigProvider>) -> Self {
        Self::with_signer(Arc::new(SharedKeySigner), config)
    }

    #[must_use]
    pub fn with_signer(signer: Arc<dyn AccessSigner>, config: Arc<dyn BrokerConfigProvider>) -> Self {
        Self::new(ResourceTypeRegistry::with_defaults(signer, config))
    }

    #[must_use]
    pub fn registry(&self) -> &ResourceTypeRegistry {
        &self.registry
    }

    /// Validates and signs a request in one step.
    ///
    /// # Errors
    /// - `MissingArgument` for a blank type token or a `null` parameter object
    /// - `InvalidArgument` for a blank connection string
    /// - an input validation error for an unknown type or bad parameters
    /// - `ConfigurationMissing` if settings hold no usable connection string
    /// - any error from the broker while signing
    #[tracing::instrument(level = "debug", skip(self, raw, source))]
    pub fn generate(
        &self,
        resource_type: &str,
        raw: &Value,
        source: CredentialSource<'_>,
    ) -> BrokerResult<ResourceToken> {
        check_arguments(resource_type, raw)?;
        if let CredentialSource::ConnectionString(cs) = source {
            check_connection_string(cs)?;
        }
        let request = self.validate(resource_type, raw)?;
        self.issue(&request, source)
    }

    /// Resolves the broker and validates the parameters, without signing.
    ///
    /// # Errors
    /// See [`generate`](Self::generate).
    pub fn validate(&self, resource_type: &str, raw: &Value) -> BrokerResult<ValidatedRequest> {
        check_arguments(resource_type, raw)?;

        let broker = Arc::clone(self.registry.lookup(resource_type)?);
        debug!(kind = %broker.kind(), "resource type resolved");

        let parameters = broker.extract_parameters(raw)?;
        debug!(kind = %broker.kind(), name = %parameters.name, "parameters validated");

        Ok(ValidatedRequest { broker, parameters })
    }

    /// Signs a previously validated request.
    ///
    /// # Errors
    /// See [`generate`](Self::generate).
    pub fn issue(&self, request: &ValidatedRequest, source: CredentialSource<'_>) -> BrokerResult<ResourceToken> {
        issue_with(request.broker.as_ref(), &request.parameters, source)
    }

    /// Signs parameters built in code rather than parsed from a request.
    ///
    /// # Errors
    /// `UnknownResourceType` if no broker is registered for `kind`, otherwise
    /// as [`issue`](Self::issue).
    #[tracing::instrument(level = "debug", skip(self, params, source), fields(name = %params.name))]
    pub fn generate_typed(
        &self,
        kind: ResourceKind,
        params: &ResourceParameters,
        source: CredentialSource<'_>,
    ) -> BrokerResult<ResourceToken> {
        let broker = self
            .registry
            .get(kind)
            .ok_or_else(|| broker_error!(UnknownResourceType, "no broker registered for {}", kind))?;
        issue_with(broker.as_ref(), params, source)
    }

    /// The connection string a request for `resource_type` would use.
    ///
    /// # Errors
    /// `MissingArgument` for a blank token, `UnknownResourceType`, or
    /// `ConfigurationMissing`.
    pub fn connection_string(&self, resource_type: &str, settings: &ConnectionSettings) -> BrokerResult<String> {
        if resource_type.trim().is_empty() {
            return Err(broker_error!(MissingArgument, "resource type must not be blank"));
        }
        self.registry.lookup(resource_type)?.resolve_connection_string(settings)
    }
}

fn check_arguments(resource_type: &str, raw: &Value) -> BrokerResult<()> {
    if resource_type.trim().is_empty() {
        return Err(broker_error!(MissingArgument, "resource type must not be blank"));
    }
    if raw.is_null() {
        return Err(broker_error!(MissingArgument, "resource parameters are required"));
    }
    Ok(())
}

fn check_connection_string(cs: &str) -> BrokerResult<()> {
    if cs.trim().is_empty() {
        return Err(broker_error!(InvalidArgument, "connection string must not be blank"));
    }
    Ok(())
}

fn issue_with(
    broker: &dyn ResourceBroker,
    params: &ResourceParameters,
    source: CredentialSource<'_>,
) -> BrokerResult<ResourceToken> {
    let connection_string = match source {
        CredentialSource::ConnectionString(cs) => {
            check_connection_string(cs)?;
            cs.to_owned()
        }
        CredentialSource::Settings(settings) => broker.resolve_connection_string(settings)?,
    };
    debug!(kind = %broker.kind(), "connection string resolved");

    broker.create_token(&connection_string, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::BrokerErrorCode;
    use crate::permission::PermissionSet;

    use serde_json::json;

    const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=test;AccountKey=3w1OwI/N6dqvmN0Iaa0/y6zlqL81H42K/mfIbIIKeFQkNpHSNvOcnWpucvrX5rbKGm+WKEUxaOZikeTMWpXfxA==";

    fn generic() -> ConnectionSettings {
        [("ResourceBrokerStorageConnectionString", CONN)].into_iter().collect()
    }

    #[test]
    fn argument_contract() {
        let manager = ResourceRequestManager::default();
        let raw = json!({"name": "q", "permissions": "r"});

        for ty in ["", "   "] {
            let err = manager.generate(ty, &raw, CredentialSource::ConnectionString(CONN)).unwrap_err();
            assert_eq!(err.code(), BrokerErrorCode::MissingArgument);
        }

        let err = manager
            .generate("queue", &Value::Null, CredentialSource::ConnectionString(CONN))
            .unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::MissingArgument);

        for cs in ["", " "] {
            let err = manager.generate("queue", &raw, CredentialSource::ConnectionString(cs)).unwrap_err();
            assert_eq!(err.code(), BrokerErrorCode::InvalidArgument);
        }
    }

    #[test]
    fn unknown_type_before_parameters() {
        let manager = ResourceRequestManager::default();
        let err = manager
            .generate("file", &json!({"bogus": true}), CredentialSource::Settings(&generic()))
            .unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::UnknownResourceType);
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[test]
    fn validate_then_issue() {
        let manager = ResourceRequestManager::default();
        let request = manager.validate("Queue", &json!({"name": "jobs", "permissions": "p"})).unwrap();
        assert_eq!(request.kind(), ResourceKind::Queue);
        assert_eq!(request.parameters().permissions, PermissionSet::PROCESS);

        let token = manager.issue(&request, CredentialSource::Settings(&generic())).unwrap();
        assert!(token.uri().starts_with("https://test.queue.core.windows.net/jobs?"));
    }

    #[test]
    fn typed_entry_point() {
        let manager = ResourceRequestManager::default();
        let params = ResourceParameters::new("blob", PermissionSet::WRITE).with_container("container");
        let token = manager
            .generate_typed(ResourceKind::Blob, &params, CredentialSource::ConnectionString(CONN))
            .unwrap();
        assert_eq!(token.query_param("sp"), Some("w"));

        let empty = ResourceRequestManager::new(ResourceTypeRegistry::new());
        let err = empty
            .generate_typed(ResourceKind::Blob, &params, CredentialSource::ConnectionString(CONN))
            .unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::UnknownResourceType);
    }

    #[test]
    fn connection_string_lookup() {
        let manager = ResourceRequestManager::default();
        let settings: ConnectionSettings = [("ResourceBrokerTableConnectionString", "table-cs")].into_iter().collect();
        assert_eq!(manager.connection_string("TABLE", &settings).unwrap(), "table-cs");

        let err = manager.connection_string("blob", &settings).unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::ConfigurationMissing);
        let err = manager.connection_string(" ", &settings).unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::MissingArgument);
    }
}
