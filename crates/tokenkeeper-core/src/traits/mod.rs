//! Core traits for credential persistence and the authentication endpoint.

mod backend;
mod store;

pub use backend::{AuthBackend, LoginOutput, RefreshClient};
pub use store::{ACCESS_CREDENTIAL_KEY, CredentialStore, REFRESH_CREDENTIAL_KEY};
