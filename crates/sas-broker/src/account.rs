//! Storage accounts
//!
//! A [`StorageAccount`] is the parsed form of a connection string such as
//! `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...`.

use crate::kind::ResourceKind;

use std::fmt;

use zeroize::Zeroizing;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
const DEFAULT_PROTOCOL: &str = "https";

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str = "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEV_QUEUE_ENDPOINT: &str = "http://127.0.0.1:10001/devstoreaccount1";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Error type for connection strings that cannot be turned into an account.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionStringError {
    #[error("connection string is empty")]
    Empty,
    #[error("malformed connection string segment at position {0}")]
    MalformedSegment(usize),
    #[error("connection string has no AccountName")]
    MissingAccountName,
    #[error("connection string has no AccountKey")]
    MissingAccountKey,
    #[error("AccountKey is not valid base64")]
    InvalidAccountKey(#[source] base64_simd::Error),
    #[error("unsupported DefaultEndpointsProtocol: {0}")]
    InvalidProtocol(String),
}

/// Decoded account key, wiped on drop.
#[derive(Clone)]
pub struct AccountKey(Zeroizing<Vec<u8>>);

impl AccountKey {
    /// Decodes a base64 account key.
    ///
    /// # Errors
    /// Returns an error if `s` is not valid base64.
    pub fn from_base64(s: &str) -> Result<Self, ConnectionStringError> {
        let bytes = base64_simd::STANDARD
            .decode_to_vec(s.trim())
            .map_err(ConnectionStringError::InvalidAccountKey)?;
        Ok(Self(Zeroizing::new(bytes)))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountKey(<redacted>)")
    }
}

/// A storage account with its key and per-service endpoints.
#[derive(Debug, Clone)]
pub struct StorageAccount {
    name: String,
    key: AccountKey,
    blob_endpoint: String,
    table_endpoint: String,
    queue_endpoint: String,
}

impl StorageAccount {
    /// Parses a connection string.
    ///
    /// Keys are matched case-insensitively. Explicit `BlobEndpoint`,
    /// `TableEndpoint` and `QueueEndpoint` win over endpoints derived from
    /// `AccountName`, `DefaultEndpointsProtocol` and `EndpointSuffix`.
    /// `UseDevelopmentStorage=true` selects the local emulator account.
    ///
    /// # Errors
    /// Returns [`ConnectionStringError`] if the string is malformed or lacks
    /// the account name or key.
    ///
    /// # Examples
    /// ```
    /// # use sas_broker::account::StorageAccount;
    /// let account = StorageAccount::parse("AccountName=test;AccountKey=a2V5").unwrap();
    /// assert_eq!(account.name(), "test");
    /// assert_eq!(account.blob_endpoint(), "https://test.blob.core.windows.net");
    ///
    /// assert!(StorageAccount::parse("AccountName=test").is_err());
    /// ```
    pub fn parse(connection_string: &str) -> Result<Self, ConnectionStringError> {
        if connection_string.trim().is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let mut fields = Fields::default();
        for (i, segment) in connection_string.split(';').enumerate() {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once('=') else {
                return Err(ConnectionStringError::MalformedSegment(i));
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(ConnectionStringError::MalformedSegment(i));
            }
            fields.set(key, value);
        }

        if fields.use_development_storage.is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return Self::development();
        }

        let name = fields.account_name.ok_or(ConnectionStringError::MissingAccountName)?;
        if name.is_empty() {
            return Err(ConnectionStringError::MissingAccountName);
        }
        let key = match fields.account_key {
            Some(k) if !k.is_empty() => AccountKey::from_base64(k)?,
            _ => return Err(ConnectionStringError::MissingAccountKey),
        };

        let protocol = fields.protocol.unwrap_or(DEFAULT_PROTOCOL);
        if !(protocol.eq_ignore_ascii_case("https") || protocol.eq_ignore_ascii_case("http")) {
            return Err(ConnectionStringError::InvalidProtocol(protocol.to_owned()));
        }
        let protocol = protocol.to_ascii_lowercase();
        let suffix = fields.endpoint_suffix.unwrap_or(DEFAULT_ENDPOINT_SUFFIX);

        let endpoint = |explicit: Option<&str>, service: &str| match explicit {
            Some(e) => e.trim_end_matches('/').to_owned(),
            None => format!("{protocol}://{name}.{service}.{suffix}"),
        };

        Ok(Self {
            blob_endpoint: endpoint(fields.blob_endpoint, "blob"),
            table_endpoint: endpoint(fields.table_endpoint, "table"),
            queue_endpoint: endpoint(fields.queue_endpoint, "queue"),
            name: name.to_owned(),
            key,
        })
    }

    /// The local storage emulator account.
    ///
    /// # Errors
    /// Never fails in practice; the emulator key is a constant.
    pub fn development() -> Result<Self, ConnectionStringError> {
        Ok(Self {
            name: DEV_ACCOUNT_NAME.to_owned(),
            key: AccountKey::from_base64(DEV_ACCOUNT_KEY)?,
            blob_endpoint: DEV_BLOB_ENDPOINT.to_owned(),
            table_endpoint: DEV_TABLE_ENDPOINT.to_owned(),
            queue_endpoint: DEV_QUEUE_ENDPOINT.to_owned(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &AccountKey {
        &self.key
    }

    #[must_use]
    pub fn blob_endpoint(&self) -> &str {
        &self.blob_endpoint
    }

    #[must_use]
    pub fn table_endpoint(&self) -> &str {
        &self.table_endpoint
    }

    #[must_use]
    pub fn queue_endpoint(&self) -> &str {
        &self.queue_endpoint
    }

    #[must_use]
    pub fn endpoint(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Blob => &self.blob_endpoint,
            ResourceKind::Table => &self.table_endpoint,
            ResourceKind::Queue => &self.queue_endpoint,
        }
    }

    /// Builds the URI of a resource without any query.
    ///
    /// Blob resources live under their container. Path segments are
    /// percent-encoded while `/` separators inside a blob name are kept.
    ///
    /// ```
    /// # use sas_broker::account::StorageAccount;
    /// # use sas_broker::ResourceKind;
    /// let account = StorageAccount::parse("AccountName=test;AccountKey=a2V5").unwrap();
    /// assert_eq!(
    ///     account.resource_uri(ResourceKind::Blob, Some("photos"), "2024/cat 1.png"),
    ///     "https://test.blob.core.windows.net/photos/2024/cat%201.png",
    /// );
    /// assert_eq!(
    ///     account.resource_uri(ResourceKind::Queue, None, "jobs"),
    ///     "https://test.queue.core.windows.net/jobs",
    /// );
    /// ```
    #[must_use]
    pub fn resource_uri(&self, kind: ResourceKind, container: Option<&str>, name: &str) -> String {
        let endpoint = self.endpoint(kind);
        match (kind, container) {
            (ResourceKind::Blob, Some(container)) => {
                format!("{endpoint}/{}/{}", urlencoding::encode(container), encode_path(name))
            }
            _ => format!("{endpoint}/{}", urlencoding::encode(name)),
        }
    }
}

fn encode_path(name: &str) -> String {
    name.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
}

#[derive(Default)]
struct Fields<'a> {
    protocol: Option<&'a str>,
    account_name: Option<&'a str>,
    account_key: Option<&'a str>,
    endpoint_suffix: Option<&'a str>,
    blob_endpoint: Option<&'a str>,
    table_endpoint: Option<&'a str>,
    queue_endpoint: Option<&'a str>,
    use_development_storage: Option<&'a str>,
}

impl<'a> Fields<'a> {
    fn set(&mut self, key: &str, value: &'a str) {
        let slot = match key.to_ascii_lowercase().as_str() {
            "defaultendpointsprotocol" => &mut self.protocol,
            "accountname" => &mut self.account_name,
            "accountkey" => &mut self.account_key,
            "endpointsuffix" => &mut self.endpoint_suffix,
            "blobendpoint" => &mut self.blob_endpoint,
            "tableendpoint" => &mut self.table_endpoint,
            "queueendpoint" => &mut self.queue_endpoint,
            "usedevelopmentstorage" => &mut self.use_development_storage,
            _ => return,
        };
        *slot = Some(value);
    }
}
