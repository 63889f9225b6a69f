//! Request parameters
//!
//! Callers send a loose JSON object. It is read into one of the request
//! shapes ([`DefaultRequest`], [`BlobRequest`]) and then validated into
//! [`ResourceParameters`].

use crate::codec;
use crate::error::BrokerResult;
use crate::permission::{AllowedPermissions, PermissionSet};
use crate::timestamp::parse_expiry;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Request body for tables and queues.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

/// Request body for blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRequest {
    #[serde(flatten)]
    pub base: DefaultRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl DefaultRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, permissions: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            permissions: Some(permissions.into()),
            expiry: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.expiry = Some(expiry.into());
        self
    }
}

impl BlobRequest {
    #[must_use]
    pub fn new(container: impl Into<String>, name: impl Into<String>, permissions: impl Into<String>) -> Self {
        Self {
            base: DefaultRequest::new(name, permissions),
            container: Some(container.into()),
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.base.expiry = Some(expiry.into());
        self
    }
}

/// Validated parameters of one token request.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ResourceParameters {
    pub name: String,
    pub permissions: PermissionSet,
    /// `None` means the token has no end bound.
    pub expiration: Option<OffsetDateTime>,
    /// Blob container, `None` for other kinds.
    pub container: Option<String>,
    /// The request as received.
    pub raw_input: Value,
}

impl ResourceParameters {
    #[must_use]
    pub fn new(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            name: name.into(),
            permissions,
            expiration: None,
            container: None,
            raw_input: Value::Null,
        }
    }

    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    #[must_use]
    pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Validates a table or queue request.
    ///
    /// # Errors
    /// Returns an input validation error if `name` or `permissions` is
    /// missing or invalid, or if `expiry` is malformed.
    pub fn from_default_request(raw: &Value, allowed: AllowedPermissions) -> BrokerResult<Self> {
        let req: DefaultRequest = read_shape(raw)?;
        validate_base(&req, allowed, raw)
    }

    /// Validates a blob request.
    ///
    /// # Errors
    /// As [`from_default_request`](Self::from_default_request), plus a missing
    /// or blank `container`.
    pub fn from_blob_request(raw: &Value, allowed: AllowedPermissions) -> BrokerResult<Self> {
        let req: BlobRequest = read_shape(raw)?;
        let mut params = validate_base(&req.base, allowed, raw)?;
        params.container = Some(require(req.container.as_deref(), "container")?.to_owned());
        Ok(params)
    }
}

fn read_shape<T: DeserializeOwned>(raw: &Value) -> BrokerResult<T> {
    if !raw.is_object() {
        return Err(bad_request!("resource request must be a JSON object"));
    }
    T::deserialize(raw).map_err(|e| broker_error!(e, InvalidParameter, "malformed resource request"))
}

fn require<'a>(value: Option<&'a str>, field: &str) -> BrokerResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(broker_error!(MissingParameter, "{} parameter is required", field)),
    }
}

fn validate_base(req: &DefaultRequest, allowed: AllowedPermissions, raw: &Value) -> BrokerResult<ResourceParameters> {
    let name = require(req.name.as_deref(), "name")?;
    let letters = require(req.permissions.as_deref(), "permissions")
        .map_err(|_| broker_error!(InvalidPermissionString, "permissions parameter is required"))?;
    let permissions = codec::decode(letters, allowed)?;
    let expiration = match req.expiry.as_deref() {
        None => None,
        Some(s) => Some(parse_expiry(s).map_err(|e| broker_error!(e, InvalidExpiry, "invalid expiry: {}", s))?),
    };

    Ok(ResourceParameters {
        name: name.to_owned(),
        permissions,
        expiration,
        container: None,
        raw_input: raw.clone(),
    })
}
