//! Credential store trait.

use crate::{AccessCredential, RefreshCredential};

/// Durable-scope key holding the refresh credential.
pub const REFRESH_CREDENTIAL_KEY: &str = "refresh-token";

/// Volatile-scope key holding the access credential.
pub const ACCESS_CREDENTIAL_KEY: &str = "access-token";

/// Two independent persistence scopes distinguished by lifetime.
///
/// The durable scope survives restarts and holds the refresh credential.
/// The volatile scope lives only as long as the current session of the host
/// (a browsing session, a process) and holds the access credential.
///
/// The store performs no validation. Writing `None` removes the entry. Every
/// write is visible to subsequent reads in the same process; writes are
/// fire-and-forget, so implementations log I/O failures instead of returning
/// them, and there is no transaction spanning both scopes.
pub trait CredentialStore: Send + Sync {
    /// Read the refresh credential from the durable scope.
    fn read_refresh_credential(&self) -> Option<RefreshCredential>;

    /// Write or remove the refresh credential in the durable scope.
    fn write_refresh_credential(&self, value: Option<&RefreshCredential>);

    /// Read the access credential from the volatile scope.
    fn read_access_credential(&self) -> Option<AccessCredential>;

    /// Write or remove the access credential in the volatile scope.
    fn write_access_credential(&self, value: Option<&AccessCredential>);
}
