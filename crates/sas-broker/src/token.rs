use serde::{Deserialize, Serialize};

/// A signed resource URI, handed to the caller once and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceToken {
    pub uri: String,
}

impl ResourceToken {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The resource URI with the signature query removed.
    #[must_use]
    pub fn resource_uri(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(base, _)| base)
    }

    /// The signature query, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, q)| q)
    }

    /// Looks up one query parameter, still percent-encoded.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == key).then_some(v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts() {
        let token = ResourceToken::new("https://test.blob.core.windows.net/c/b?sv=2015-04-05&sp=rw&sig=abc%3D");
        assert_eq!(token.resource_uri(), "https://test.blob.core.windows.net/c/b");
        assert_eq!(token.query(), Some("sv=2015-04-05&sp=rw&sig=abc%3D"));
        assert_eq!(token.query_param("sp"), Some("rw"));
        assert_eq!(token.query_param("sig"), Some("abc%3D"));
        assert_eq!(token.query_param("se"), None);

        let bare = ResourceToken::new("https://x/y");
        assert_eq!(bare.resource_uri(), "https://x/y");
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn json_shape() {
        let token = ResourceToken::new("https://x/y?sig=1");
        assert_eq!(serde_json::to_string(&token).unwrap(), r#"{"uri":"https://x/y?sig=1"}"#);
    }
}
