//! Access control for token requests
//!
//! The broker itself does not know who is asking. Before a token is issued,
//! the host calls [`BrokerAccess::check`] with the resolved resource kind, the
//! validated parameters and the request headers. Returning an error stops the
//! request with `403 AccessDenied`.
//!
//! Authentication is out of scope here. Put the server behind whatever
//! identity layer you already run and inspect what it forwards, for example a
//! trusted header set by a gateway.
//!
//! # Example
//!
//! ```
//! use sas_broker::{PermissionSet, ResourceKind};
//! use sas_broker_server::access::{AccessDenied, BrokerAccess, BrokerAccessContext};
//!
//! struct ReadOnlyTables;
//!
//! #[async_trait::async_trait]
//! impl BrokerAccess for ReadOnlyTables {
//!     async fn check(&self, cx: &mut BrokerAccessContext<'_>) -> Result<(), AccessDenied> {
//!         if cx.kind() == ResourceKind::Table && cx.parameters().permissions != PermissionSet::READ {
//!             return Err(AccessDenied::new("tables are read-only"));
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use sas_broker::{ResourceKind, ResourceParameters};

use std::borrow::Cow;

use http::HeaderMap;

/// The caller may not receive the requested token.
#[derive(Debug, thiserror::Error)]
#[error("access denied: {message}")]
pub struct AccessDenied {
    message: Cow<'static, str>,
}

impl AccessDenied {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a [`BrokerAccess`] implementation gets to look at.
pub struct BrokerAccessContext<'a> {
    pub(crate) kind: ResourceKind,
    pub(crate) parameters: &'a ResourceParameters,
    pub(crate) headers: &'a HeaderMap,
}

impl BrokerAccessContext<'_> {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Parameters after validation. Permissions are already decoded.
    #[must_use]
    pub fn parameters(&self) -> &ResourceParameters {
        self.parameters
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.headers
    }
}

/// Decides whether a validated request may be signed.
#[async_trait::async_trait]
pub trait BrokerAccess: Send + Sync + 'static {
    /// Called once per request, after validation and before signing.
    ///
    /// # Errors
    /// Returns [`AccessDenied`] to reject the request.
    async fn check(&self, cx: &mut BrokerAccessContext<'_>) -> Result<(), AccessDenied>;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait::async_trait]
impl BrokerAccess for AllowAll {
    async fn check(&self, _: &mut BrokerAccessContext<'_>) -> Result<(), AccessDenied> {
        Ok(())
    }
}
