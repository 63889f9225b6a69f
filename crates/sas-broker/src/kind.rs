//! Resource kinds

use crate::error::{BrokerError, BrokerResult};
use crate::permission::AllowedPermissions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Generic connection string setting, used when no kind-specific one is set.
pub const GENERIC_CONNECTION_STRING_KEY: &str = "ResourceBrokerStorageConnectionString";

/// A storage resource kind the broker can issue tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Blob,
    Table,
    Queue,
}

impl ResourceKind {
    pub const ALL: [Self; 3] = [Self::Blob, Self::Table, Self::Queue];

    /// Matches a type token case-insensitively.
    ///
    /// ```
    /// use sas_broker::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::from_token("BLOB"), Some(ResourceKind::Blob));
    /// assert_eq!(ResourceKind::from_token("Queue"), Some(ResourceKind::Queue));
    /// assert_eq!(ResourceKind::from_token("file"), None);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str().eq_ignore_ascii_case(token))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Table => "table",
            Self::Queue => "queue",
        }
    }

    #[must_use]
    pub const fn allowed_permissions(self) -> AllowedPermissions {
        match self {
            Self::Blob => AllowedPermissions::BLOB,
            Self::Table => AllowedPermissions::TABLE,
            Self::Queue => AllowedPermissions::QUEUE,
        }
    }

    /// The kind-specific connection string setting, e.g.
    /// `ResourceBrokerBlobConnectionString`.
    #[must_use]
    pub const fn connection_string_key(self) -> &'static str {
        match self {
            Self::Blob => "ResourceBrokerBlobConnectionString",
            Self::Table => "ResourceBrokerTableConnectionString",
            Self::Queue => "ResourceBrokerQueueConnectionString",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = BrokerError;

    fn from_str(s: &str) -> BrokerResult<Self> {
        Self::from_token(s).ok_or_else(|| broker_error!(UnknownResourceType, "unknown resource type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::BrokerErrorCode;

    #[test]
    fn tokens() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_token(kind.as_str()), Some(kind));
            assert_eq!(ResourceKind::from_token(&kind.as_str().to_uppercase()), Some(kind));
        }
        assert_eq!(ResourceKind::from_token(" table "), Some(ResourceKind::Table));
        assert_eq!(ResourceKind::from_token(""), None);
        assert_eq!(ResourceKind::from_token("blobs"), None);
    }

    #[test]
    fn from_str_unknown() {
        let err = "file".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err.code(), BrokerErrorCode::UnknownResourceType);
    }

    #[test]
    fn setting_keys() {
        assert_eq!(ResourceKind::Blob.connection_string_key(), "ResourceBrokerBlobConnectionString");
        assert_eq!(ResourceKind::Table.connection_string_key(), "ResourceBrokerTableConnectionString");
        assert_eq!(ResourceKind::Queue.connection_string_key(), "ResourceBrokerQueueConnectionString");
    }

    #[test]
    fn serde_lowercase() {
        let s = serde_json::to_string(&ResourceKind::Queue).unwrap();
        assert_eq!(s, "\"queue\"");
        let kind: ResourceKind = serde_json::from_str("\"blob\"").unwrap();
        assert_eq!(kind, ResourceKind::Blob);
    }
}
