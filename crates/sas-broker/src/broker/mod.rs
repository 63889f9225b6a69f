//! Resource brokers
//!
//! One [`ResourceBroker`] per storage kind. Brokers own the per-kind policy
//! (grantable permissions, request shape, container handling) and share the
//! rest through [`TokenIssuer`] and
//! [`StorageCredentialResolver`](crate::settings::StorageCredentialResolver).

mod blob;
mod queue;
mod table;

pub use self::blob::BlobBroker;
pub use self::queue::QueueBroker;
pub use self::table::TableBroker;

use crate::account::StorageAccount;
use crate::codec;
use crate::config::{BrokerConfigProvider, StaticConfigProvider};
use crate::error::BrokerResult;
use crate::kind::ResourceKind;
use crate::params::ResourceParameters;
use crate::permission::AllowedPermissions;
use crate::settings::{ConnectionSettings, StorageCredentialResolver};
use crate::signer::{AccessSigner, SharedKeySigner, SignatureRequest};
use crate::token::ResourceToken;

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

/// Per-kind token policy.
pub trait ResourceBroker: Send + Sync + 'static {
    fn kind(&self) -> ResourceKind;

    fn allowed_permissions(&self) -> AllowedPermissions {
        self.kind().allowed_permissions()
    }

    /// Validates a raw request into parameters.
    ///
    /// # Errors
    /// Returns an input validation error for missing or malformed fields.
    fn extract_parameters(&self, raw: &Value) -> BrokerResult<ResourceParameters>;

    /// Picks the connection string for this kind.
    ///
    /// # Errors
    /// Returns `ConfigurationMissing` if no usable setting exists.
    fn resolve_connection_string(&self, settings: &ConnectionSettings) -> BrokerResult<String> {
        StorageCredentialResolver::resolve(self.kind(), settings)
    }

    /// Builds a signed token as of `now`.
    ///
    /// # Errors
    /// Returns an argument error for a blank connection string, a
    /// configuration error if it cannot be parsed, or an error from the signer.
    fn create_token_at(
        &self,
        connection_string: &str,
        params: &ResourceParameters,
        now: OffsetDateTime,
    ) -> BrokerResult<ResourceToken>;

    /// Builds a signed token as of the current time.
    ///
    /// # Errors
    /// See [`create_token_at`](Self::create_token_at).
    fn create_token(&self, connection_string: &str, params: &ResourceParameters) -> BrokerResult<ResourceToken> {
        self.create_token_at(connection_string, params, OffsetDateTime::now_utc())
    }
}

/// Signs tokens for any kind. Brokers hold one and pass their policy in.
#[derive(Clone)]
pub struct TokenIssuer {
    signer: Arc<dyn AccessSigner>,
    config: Arc<dyn BrokerConfigProvider>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(signer: Arc<dyn AccessSigner>, config: Arc<dyn BrokerConfigProvider>) -> Self {
        Self { signer, config }
    }

    /// Issues a token for `params.name` (inside `container` for blobs).
    ///
    /// The window starts `clock_skew_secs` before `now` and ends at the
    /// requested expiration, or is open-ended.
    ///
    /// # Errors
    /// - `InvalidArgument` if `connection_string` or `params.name` is blank
    /// - `InvalidConnectionString` if the connection string cannot be parsed
    /// - `InvalidPermissionString` if the permissions have no native form or
    ///   grant nothing on this kind
    /// - `SignatureFailure` from the signer
    pub fn issue(
        &self,
        kind: ResourceKind,
        connection_string: &str,
        params: &ResourceParameters,
        container: Option<&str>,
        now: OffsetDateTime,
    ) -> BrokerResult<ResourceToken> {
        if connection_string.trim().is_empty() {
            return Err(broker_error!(InvalidArgument, "connection string must not be blank"));
        }
        if params.name.trim().is_empty() {
            return Err(broker_error!(InvalidArgument, "resource name must not be blank"));
        }

        let account = StorageAccount::parse(connection_string)
            .map_err(|e| broker_error!(e, InvalidConnectionString, "storage connection string is invalid"))?;
        let permissions = codec::encode(kind, params.permissions)?;
        if permissions.is_empty() {
            return Err(broker_error!(
                InvalidPermissionString,
                "permissions grant no {} rights",
                kind
            ));
        }

        let config = self.config.snapshot();
        let start = now.saturating_sub(config.clock_skew());

        let req = SignatureRequest {
            kind,
            account: &account,
            resource_name: &params.name,
            container,
            permissions: &permissions,
            start,
            expiry: params.expiration,
            protocol: config.protocol(),
            version: &config.signed_version,
        };
        let query = self.signer.compute_access_signature(&req)?;

        let uri = format!("{}?{query}", account.resource_uri(kind, container, &params.name));
        debug!(%kind, name = %params.name, sp = %permissions, "token issued");
        Ok(ResourceToken::new(uri))
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new(Arc::new(SharedKeySigner), Arc::new(StaticConfigProvider::default()))
    }
}
