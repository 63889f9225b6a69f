//! HTTP transport
//!
//! The client never builds its own HTTP stack. Hand it an [`HttpTransport`]:
//! [`ReqwestTransport`] for real traffic, or anything else that can answer an
//! [`http::Request`] (a mock in tests, a middleware-wrapped client in an app).

use crate::error::TransportError;

use bytes::Bytes;
use http::{Request, Response};

/// Sends one buffered HTTP request and buffers the response.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// # Errors
    /// Returns [`TransportError`] if no response was received. Non-success
    /// statuses are *not* errors at this level.
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError>;
}

/// [`HttpTransport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let req = reqwest::Request::try_from(req).map_err(TransportError::new)?;
        let resp = self.client.execute(req).await.map_err(TransportError::new)?;

        let mut builder = Response::builder().status(resp.status()).version(resp.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(resp.headers().iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let body = resp.bytes().await.map_err(TransportError::new)?;
        builder.body(body).map_err(TransportError::new)
    }
}
