//! Authentication operations and the GraphQL envelope types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Operation Documents
// ============================================================================

/// auth_login
pub const LOGIN: &str = r#"
  mutation login($email: String!, $password: String!) {
    auth_login(email: $email, password: $password) {
      access_token
      organization_id
      refresh_token
      user_id
    }
  }
"#;

/// auth_refresh_token
pub const REFRESH_TOKEN: &str = r#"
  mutation refresh_token($refresh_token: String!) {
    auth_refresh_token(refresh_token: $refresh_token) {
      access_token
    }
  }
"#;

/// auth_register
pub const REGISTER: &str = r#"
  mutation register($email: String!, $password: String!) {
    auth_register(email: $email, password: $password) {
      affected_rows
    }
  }
"#;

/// auth_change_password
pub const CHANGE_PASSWORD: &str = r#"
  mutation change_password($user_id: ID!, $new_password: String!) {
    auth_change_password(new_password: $new_password, user_id: $user_id) {
      affected_rows
    }
  }
"#;

/// The message the server answers a rejected refresh credential with.
pub const INVALID_REFRESH_MESSAGE: &str = "Invalid 'refresh_token' or 'user_id'";

// ============================================================================
// Envelope
// ============================================================================

/// Request body for every operation.
#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    pub variables: &'a V,
}

/// Response body: `data` on success, `errors` on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

// ============================================================================
// Variables
// ============================================================================

/// Variables for login and register.
#[derive(Debug, Serialize)]
pub(crate) struct EmailPassword<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenVariables<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordVariables<'a> {
    pub user_id: &'a str,
    pub new_password: &'a str,
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub auth_login: LoginResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, deserialize_with = "id::optional")]
    pub organization_id: Option<String>,
    #[serde(deserialize_with = "id::required")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshTokenData {
    pub auth_refresh_token: RefreshTokenResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshTokenResult {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterData {
    pub auth_register: AffectedRows,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordData {
    pub auth_change_password: AffectedRows,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AffectedRows {
    pub affected_rows: u64,
}

/// Identifiers arrive as either strings or numbers.
mod id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    impl From<Id> for String {
        fn from(id: Id) -> Self {
            match id {
                Id::Text(s) => s,
                Id::Number(n) => n.to_string(),
            }
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Id::deserialize(d).map(String::from)
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Option::<Id>::deserialize(d).map(|id| id.map(String::from))
    }
}
