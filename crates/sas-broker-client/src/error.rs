use http::StatusCode;

pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The request never produced a response.
#[derive(Debug, thiserror::Error)]
#[error("transport error: {source}")]
pub struct TransportError {
    #[source]
    source: StdError,
}

impl TransportError {
    #[must_use]
    pub fn new(source: impl Into<StdError>) -> Self {
        Self { source: source.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("broker endpoint not found")]
    EndpointNotFound,

    #[error("broker rejected the request with {status}: {code}: {message}")]
    Broker {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("invalid response from broker: {0}")]
    InvalidBrokerResponse(&'static str),

    #[error("storage rejected the upload with {status}")]
    Storage { status: StatusCode, body: String },

    #[error("invalid broker endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Http(#[from] http::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Time(#[from] sas_broker::timestamp::FormatTimestampError),
}

impl ClientError {
    /// The HTTP status behind the error, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::EndpointNotFound => Some(StatusCode::NOT_FOUND),
            Self::Broker { status, .. } | Self::Storage { status, .. } => Some(*status),
            _ => None,
        }
    }
}
