//! GraphQL endpoint URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated GraphQL endpoint URL.
///
/// Endpoints must use HTTPS; plain HTTP is accepted only for loopback hosts
/// so that credentials never cross the network unencrypted.
///
/// # Example
///
/// ```
/// use tokenkeeper_core::EndpointUrl;
///
/// let endpoint = EndpointUrl::new("https://api.example.com/v1/graphql").unwrap();
/// assert_eq!(endpoint.host(), Some("api.example.com"));
///
/// assert!(EndpointUrl::new("http://api.example.com/v1/graphql").is_err());
/// assert!(EndpointUrl::new("http://localhost:8080/v1/graphql").is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndpointUrl(Url);

impl EndpointUrl {
    /// Create a new endpoint URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::Endpoint {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::Endpoint {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if url.cannot_be_a_base() {
            return Err(invalid("must be an absolute URL"));
        }

        let Some(host) = url.host_str() else {
            return Err(invalid("must have a host"));
        };

        let is_loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1");
        let scheme = url.scheme();

        if scheme != "https" && !(scheme == "http" && is_loopback) {
            return Err(invalid("must use HTTPS (HTTP allowed only for localhost)"));
        }

        Ok(())
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EndpointUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for EndpointUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for EndpointUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EndpointUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for EndpointUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let endpoint = EndpointUrl::new("https://hasura.example.com/v1/graphql").unwrap();
        assert_eq!(endpoint.host(), Some("hasura.example.com"));
        assert_eq!(endpoint.as_str(), "https://hasura.example.com/v1/graphql");
    }

    #[test]
    fn valid_loopback_http() {
        assert!(EndpointUrl::new("http://localhost:8080/v1/graphql").is_ok());
        assert!(EndpointUrl::new("http://127.0.0.1:8080/v1/graphql").is_ok());
        assert!(EndpointUrl::new("http://[::1]:8080/v1/graphql").is_ok());
    }

    #[test]
    fn invalid_http_non_loopback() {
        let err = EndpointUrl::new("http://hasura.example.com/v1/graphql").unwrap_err();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn invalid_relative_url() {
        assert!(EndpointUrl::new("/v1/graphql").is_err());
    }

    #[test]
    fn invalid_scheme() {
        assert!(EndpointUrl::new("file:///tmp/graphql").is_err());
        assert!(EndpointUrl::new("mailto:admin@example.com").is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: EndpointUrl = serde_json::from_str("\"https://api.example.com/graphql\"").unwrap();
        assert_eq!(ok.host(), Some("api.example.com"));
        assert!(serde_json::from_str::<EndpointUrl>("\"http://api.example.com\"").is_err());
    }
}
