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

/// Tokens for a whole table.
///
/// `p` is accepted in requests but tables have no process right, so it never
/// reaches the signature.
#[derive(Clone, Default)]
pub struct TableBroker {
    issuer: TokenIssuer,
}

impl TableBroker {
    #[must_use]
    pub fn new(signer: Arc<dyn AccessSigner>, config: Arc<dyn BrokerConfigProvider>) -> Self {
        Self {
            issuer: TokenIssuer::new(signer, config),
        }
    }
}

impl ResourceBroker for TableBroker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Table
    }

    fn extract_parameters(&self, raw: &Value) -> BrokerResult<ResourceParameters> {
        ResourceParameters::from_default_request(raw, self.allowed_permissions())
    }

    fn create_token_at(
        &self,
        connection_string: &str,
        params: &ResourceParameters,
        now: OffsetDateTime,
    ) -> BrokerResult<ResourceToken> {
        self.issuer.issue(ResourceKind::Table, connection_string, params, None, now)
    }
}
