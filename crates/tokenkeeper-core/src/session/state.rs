//! Session states and the identity projection derived from them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::claims::DecodedClaims;
use crate::{AccessCredential, Error};

/// The lifecycle state of a session. Exactly one holds at a time.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// The session has not been started.
    Uninitialized,
    /// A renewal attempt is in flight.
    Pending,
    /// An access credential is held and its claims decoded.
    Authenticated {
        access_credential: AccessCredential,
        claims: DecodedClaims,
    },
    /// No valid refresh credential, or renewal permanently failed.
    Anonymous,
    /// Renewal failed in a way that may be transient.
    Error { cause: Error },
}

impl SessionState {
    /// Returns the discriminant, convenient for comparisons and logging.
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Pending => SessionStatus::Pending,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
            SessionState::Anonymous => SessionStatus::Anonymous,
            SessionState::Error { .. } => SessionStatus::Error,
        }
    }

    /// Returns true if the state is `Authenticated`.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    /// Returns the failure cause of an `Error` state.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SessionState::Error { cause } => Some(cause),
            _ => None,
        }
    }
}

/// Payload-free view of [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Uninitialized,
    Pending,
    Authenticated,
    Anonymous,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Pending => "pending",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Read-only view of the logged-in user, derived from the access credential.
///
/// Only exists while the session is authenticated, and is rebuilt from the
/// claims every time it is requested; the expiry and roles describe one
/// specific access credential and go stale with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(skip)]
    pub access_credential: AccessCredential,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub organization_id: Option<String>,
    pub session_id: Option<String>,
    pub default_role: String,
    pub allowed_roles: BTreeSet<String>,
}

impl CurrentUser {
    pub(crate) fn new(access_credential: &AccessCredential, claims: &DecodedClaims) -> Self {
        Self {
            access_credential: access_credential.clone(),
            expires_at: claims.expiry().unwrap_or(DateTime::<Utc>::MIN_UTC),
            user_id: claims.user_id.clone(),
            organization_id: claims.organization_id.clone(),
            session_id: claims.session_id.clone(),
            default_role: claims.default_role.clone(),
            allowed_roles: claims.allowed_roles.clone(),
        }
    }
}

/// Project the current user out of a session state.
///
/// Returns `Some` only for [`SessionState::Authenticated`].
pub fn project(state: &SessionState) -> Option<CurrentUser> {
    match state {
        SessionState::Authenticated {
            access_credential,
            claims,
        } => Some(CurrentUser::new(access_credential, claims)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn claims() -> DecodedClaims {
        DecodedClaims {
            expires_at: 1_700_003_600,
            session_id: Some("s-1".into()),
            user_id: "u-1".into(),
            organization_id: Some("org-1".into()),
            default_role: "user".into(),
            allowed_roles: ["user".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn projects_only_authenticated_states() {
        let authenticated = SessionState::Authenticated {
            access_credential: AccessCredential::new("a.b.c"),
            claims: claims(),
        };
        let user = project(&authenticated).unwrap();
        assert_eq!(user.user_id, "u-1");
        assert_eq!(user.expires_at.timestamp(), 1_700_003_600);
        assert_eq!(user.access_credential, AccessCredential::new("a.b.c"));

        for state in [
            SessionState::Uninitialized,
            SessionState::Pending,
            SessionState::Anonymous,
            SessionState::Error {
                cause: TransportError::Timeout.into(),
            },
        ] {
            assert!(project(&state).is_none(), "{} projected a user", state.status());
        }
    }

    #[test]
    fn serialized_user_omits_the_credential() {
        let state = SessionState::Authenticated {
            access_credential: AccessCredential::new("secret.token.value"),
            claims: claims(),
        };
        let json = serde_json::to_string(&project(&state).unwrap()).unwrap();
        assert!(json.contains("\"userId\":\"u-1\""));
        assert!(!json.contains("secret.token.value"));
    }
}
