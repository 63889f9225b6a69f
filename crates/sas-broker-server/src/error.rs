use crate::access::AccessDenied;

use sas_broker::{BrokerError, ErrorKind};

use std::borrow::Cow;

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

/// A failed token request as seen by HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Denied(#[from] AccessDenied),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Broker(e) => e.status_code(),
            Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Broker(e) => e.code().as_str(),
            Self::Denied(_) => "AccessDenied",
            Self::MalformedBody(_) => "InvalidParameter",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message: Cow<'_, str> = match &self {
            Self::Broker(e) if e.kind() == ErrorKind::InputValidation => {
                Cow::Borrowed(e.message().unwrap_or(e.code().as_str()))
            }
            Self::Broker(e) => {
                error!(code = %e.code(), kind = ?e.kind(), err = %e, "token request failed");
                Cow::Borrowed("the broker could not issue a token")
            }
            Self::Denied(denied) => {
                debug!(reason = denied.message(), "token request denied");
                Cow::Borrowed(denied.message())
            }
            Self::MalformedBody(e) => Cow::Owned(e.to_string()),
        };
        let body = ErrorBody {
            code: self.code(),
            message: &message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}
