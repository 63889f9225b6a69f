use crate::error::ClientError;
use crate::transport::HttpTransport;

use sas_broker::timestamp::format_sas_time;
use sas_broker::{BlobRequest, ResourceKind, ResourceToken};

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use url::Url;

/// Lifetime of the token [`BrokerClient::upload_file`] asks for.
pub const UPLOAD_TOKEN_LIFETIME: Duration = Duration::hours(1);

const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
const BLOCK_BLOB: &str = "BlockBlob";

/// Talks to a broker host over HTTP.
#[derive(Clone)]
pub struct BrokerClient {
    endpoint: Url,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl BrokerClient {
    /// `endpoint` is the base URL of the broker host, e.g. `https://app.example.com/`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidEndpoint`] if `endpoint` is not an
    /// absolute `http` or `https` URL.
    pub fn new(endpoint: &str, transport: Arc<dyn HttpTransport>) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(endpoint.into()));
        }
        Ok(Self { endpoint, transport })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    fn resource_url(&self, kind: ResourceKind) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "resources", kind.as_str()]);
        }
        url
    }

    /// Asks the broker for a token.
    ///
    /// # Errors
    /// - [`ClientError::EndpointNotFound`] if the broker route does not exist
    /// - [`ClientError::Broker`] for any other non-success status
    /// - [`ClientError::InvalidBrokerResponse`] if the answer has no `uri`
    pub async fn request_token<R>(&self, kind: ResourceKind, request: &R) -> Result<ResourceToken, ClientError>
    where
        R: Serialize + Sync,
    {
        let url = self.resource_url(kind);
        let body = serde_json::to_vec(request)?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))?;

        debug!(%url, "requesting token");
        let resp = self.transport.send(req).await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::EndpointNotFound);
        }
        if !status.is_success() {
            let body: Option<ErrorBody> = serde_json::from_slice(resp.body()).ok();
            let (code, message) = body.map(|b| (b.code, b.message)).unwrap_or_default();
            return Err(ClientError::Broker {
                status,
                code: code.unwrap_or_default(),
                message: message.unwrap_or_default(),
            });
        }

        let body: Value =
            serde_json::from_slice(resp.body()).map_err(|_| ClientError::InvalidBrokerResponse("body is not JSON"))?;
        match body.get("uri").and_then(Value::as_str) {
            Some(uri) => Ok(ResourceToken::new(uri)),
            None => Err(ClientError::InvalidBrokerResponse("missing `uri`")),
        }
    }

    /// Uploads `contents` as a block blob, asking the broker for a one-hour
    /// write token first. Returns the blob URI without the signature.
    ///
    /// # Errors
    /// Any error of [`request_token`](Self::request_token) or [`upload_blob`].
    pub async fn upload_file(
        &self,
        container: &str,
        name: &str,
        content_type: &str,
        contents: Bytes,
    ) -> Result<String, ClientError> {
        let expiry = format_sas_time(OffsetDateTime::now_utc() + UPLOAD_TOKEN_LIFETIME)?;
        let request = BlobRequest::new(container, name, "w").with_expiry(expiry);
        let token = self.request_token(ResourceKind::Blob, &request).await?;
        upload_blob(self.transport(), &token, content_type, contents).await
    }
}

impl std::fmt::Debug for BrokerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerClient").field("endpoint", &self.endpoint.as_str()).finish_non_exhaustive()
    }
}

/// PUTs `contents` to the blob the token names.
///
/// Single-request uploads are limited in size by the storage service. Returns
/// the token URI with its query string removed.
///
/// # Errors
/// [`ClientError::Storage`] if storage answers with a non-success status.
pub async fn upload_blob(
    transport: &dyn HttpTransport,
    token: &ResourceToken,
    content_type: &str,
    contents: Bytes,
) -> Result<String, ClientError> {
    let req = Request::builder()
        .method(Method::PUT)
        .uri(token.uri())
        .header(BLOB_TYPE_HEADER, BLOCK_BLOB)
        .header(CONTENT_TYPE, content_type)
        .body(contents)?;

    let resp = transport.send(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = String::from_utf8_lossy(resp.body()).into_owned();
        return Err(ClientError::Storage { status, body });
    }
    debug!(%status, "blob uploaded");

    let uri = token.resource_uri();
    Ok(uri.split_once('#').map_or(uri, |(head, _)| head).to_owned())
}
