//! Credential string types.

use std::fmt;

/// A short-lived access credential carrying identity claims.
///
/// The value is an encoded JWT issued by the authentication endpoint.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Claims are decoded for display only; see [`crate::claims`]
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential(String);

impl AccessCredential {
    /// Wrap an encoded access credential.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the encoded value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing requests or writing to a credential store.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessCredential").field(&"[REDACTED]").finish()
    }
}

/// A long-lived refresh credential that authorizes issuing access credentials.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Only its `exp` claim is ever inspected locally
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshCredential(String);

impl RefreshCredential {
    /// Wrap an encoded refresh credential.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the encoded value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshCredential").field(&"[REDACTED]").finish()
    }
}
