//! tokenkeeper-core - session lifecycle for refresh/access credential pairs.
//!
//! A long-lived refresh credential is kept in a durable store and exchanged
//! for short-lived access credentials. The [`SessionManager`] drives that
//! exchange as a state machine, renews ahead of expiry, and projects the
//! decoded identity as a [`CurrentUser`].
//!
//! Network and persistence are behind the [`AuthBackend`] and
//! [`CredentialStore`] traits; see the `tokenkeeper-graphql` and
//! `tokenkeeper-file` crates for implementations.

pub mod claims;
pub mod clock;
pub mod credentials;
pub mod error;
pub mod session;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use claims::{ClaimsDecoder, DecodedClaims};
pub use clock::{Clock, SystemClock};
pub use credentials::Credentials;
pub use error::Error;
pub use session::{CurrentUser, SessionManager, SessionState, SessionStatus, project};
pub use store::MemoryStore;
pub use tokens::{AccessCredential, RefreshCredential};
pub use traits::{AuthBackend, CredentialStore, LoginOutput, RefreshClient};
pub use types::EndpointUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
