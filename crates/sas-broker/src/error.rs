//! Broker errors
//!
//! Every failure surfaced by the broker is a [`BrokerError`] carrying a
//! [`BrokerErrorCode`]. Codes are grouped into an [`ErrorKind`] which decides
//! whether the caller or the deployment is at fault.

use std::borrow::Cow;
use std::fmt;

use http::StatusCode;

pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the broker.
pub type BrokerResult<T = (), E = BrokerError> = Result<T, E>;

/// Coarse classification of a [`BrokerErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is invalid. Maps to HTTP 400.
    InputValidation,
    /// The deployment lacks or has broken configuration.
    Configuration,
    /// The embedding host violated an API precondition.
    ArgumentContract,
    /// The storage collaborator failed to sign.
    Internal,
}

/// Concrete failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BrokerErrorCode {
    /// A required argument was not supplied or was blank.
    MissingArgument,
    /// An argument was supplied but unusable.
    InvalidArgument,

    /// The resource type token does not name a known resource kind.
    UnknownResourceType,
    /// A required request field is absent or blank.
    MissingParameter,
    /// A request field has the wrong shape.
    InvalidParameter,
    /// The `expiry` field is not a valid timestamp.
    InvalidExpiry,
    /// The permission string is empty, malformed, repeats a letter or asks for
    /// a right the resource kind does not grant.
    InvalidPermissionString,

    /// No usable connection string is configured for the resource kind.
    ConfigurationMissing,
    /// A connection string could not be parsed.
    InvalidConnectionString,

    /// The signature could not be computed.
    SignatureFailure,
}

impl BrokerErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingArgument => "MissingArgument",
            Self::InvalidArgument => "InvalidArgument",
            Self::UnknownResourceType => "UnknownResourceType",
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameter => "InvalidParameter",
            Self::InvalidExpiry => "InvalidExpiry",
            Self::InvalidPermissionString => "InvalidPermissionString",
            Self::ConfigurationMissing => "ConfigurationMissing",
            Self::InvalidConnectionString => "InvalidConnectionString",
            Self::SignatureFailure => "SignatureFailure",
        }
    }

    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::MissingArgument | Self::InvalidArgument => ErrorKind::ArgumentContract,
            Self::UnknownResourceType
            | Self::MissingParameter
            | Self::InvalidParameter
            | Self::InvalidExpiry
            | Self::InvalidPermissionString => ErrorKind::InputValidation,
            Self::ConfigurationMissing | Self::InvalidConnectionString => ErrorKind::Configuration,
            Self::SignatureFailure => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self.kind() {
            ErrorKind::InputValidation => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::ArgumentContract | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for BrokerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed broker failure.
#[derive(Debug)]
pub struct BrokerError(Box<Inner>);

#[derive(Debug)]
struct Inner {
    code: BrokerErrorCode,
    message: Option<Cow<'static, str>>,
    source: Option<StdError>,
}

impl BrokerError {
    #[must_use]
    pub fn new(code: BrokerErrorCode) -> Self {
        Self(Box::new(Inner {
            code,
            message: None,
            source: None,
        }))
    }

    #[must_use]
    pub fn with_message(code: BrokerErrorCode, msg: impl Into<Cow<'static, str>>) -> Self {
        let mut this = Self::new(code);
        this.0.message = Some(msg.into());
        this
    }

    #[must_use]
    pub fn with_source(code: BrokerErrorCode, source: StdError) -> Self {
        let mut this = Self::new(code);
        this.0.source = Some(source);
        this
    }

    pub fn set_code(&mut self, code: BrokerErrorCode) {
        self.0.code = code;
    }

    pub fn set_message(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.0.message = Some(msg.into());
    }

    pub fn set_source(&mut self, source: StdError) {
        self.0.source = Some(source);
    }

    #[must_use]
    pub fn code(&self) -> BrokerErrorCode {
        self.0.code
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.0.code.kind()
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.0.code.status_code()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.0.message.as_deref()
    }

    #[must_use]
    pub fn is_input_validation(&self) -> bool {
        self.kind() == ErrorKind::InputValidation
    }
}

impl From<BrokerErrorCode> for BrokerError {
    fn from(code: BrokerErrorCode) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.code)?;
        if let Some(msg) = &self.0.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source.as_deref().map(|e| e as _)
    }
}

/// Builds a [`BrokerError`].
///
/// ```
/// use sas_broker::{broker_error, BrokerErrorCode};
///
/// let err = broker_error!(MissingParameter, "{} parameter is missing", "name");
/// assert_eq!(err.code(), BrokerErrorCode::MissingParameter);
/// assert_eq!(err.message(), Some("name parameter is missing"));
/// ```
#[macro_export]
macro_rules! broker_error {
    ($code:ident) => {
        $crate::BrokerError::new($crate::BrokerErrorCode::$code)
    };
    ($source:expr, $code:ident) => {{
        let mut err = $crate::BrokerError::new($crate::BrokerErrorCode::$code);
        err.set_source(Box::new($source));
        err
    }};
    ($code:ident, $msg:literal $(,)?) => {
        $crate::BrokerError::with_message($crate::BrokerErrorCode::$code, $msg)
    };
    ($code:ident, $fmt:literal, $($arg:tt)+) => {
        $crate::BrokerError::with_message($crate::BrokerErrorCode::$code, format!($fmt, $($arg)+))
    };
    ($source:expr, $code:ident, $($arg:tt)+) => {{
        let mut err = $crate::broker_error!($code, $($arg)+);
        err.set_source(Box::new($source));
        err
    }};
}

/// Shorthand for an [`InvalidParameter`](BrokerErrorCode::InvalidParameter) error.
macro_rules! bad_request {
    ($($arg:tt)+) => {
        $crate::broker_error!(InvalidParameter, $($arg)+)
    };
}
