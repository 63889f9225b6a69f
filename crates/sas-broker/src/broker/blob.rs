use super::{ResourceBroker, TokenIssuer};

use crate::config::BrokerConfigProvider;
use crate::error::BrokerResult;
use crate::kind::ResourceKind;
use crate::params::ResourceParameters;
use crate::signer::AccessSigner;
use crate::token::ResourceToken;

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;

/// Tokens for a single blob inside a container.
#[derive(Clone, Default)]
pub struct BlobBroker {
    issuer: TokenIssuer,
}

impl BlobBroker {
    #[must_use]
    pub fn new(signer: Arc<dyn AccessSigner>, config: Arc<dyn BrokerConfigProvider>) -> Self {
        Self {
            issuer: TokenIssuer::new(signer, config),
        }
    }
}

impl ResourceBroker for BlobBroker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Blob
    }

    fn extract_parameters(&self, raw: &Value) -> BrokerResult<ResourceParameters> {
        ResourceParameters::from_blob_request(raw, self.allowed_permissions())
    }

    fn create_token_at(
        &self,
        connection_string: &str,
        params: &ResourceParameters,
        now: OffsetDateTime,
    ) -> BrokerResult<ResourceToken> {
        let container = match params.container.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Err(broker_error!(InvalidArgument, "blob container must not be blank")),
        };
        self.issuer
            .issue(ResourceKind::Blob, connection_string, params, Some(container), now)
    }
}
