//! Claims decoding for access and refresh credentials.
//!
//! Credentials are JWTs. This module reads the payload segment and nothing
//! else: **signatures are never verified**. The client holds no key material
//! and decodes claims only to drive the UI (who is logged in, when to renew).
//! Every request is re-validated by the server, so decoded claims must never
//! be used as an authorization decision.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::MalformedCredential;
use crate::tokens::AccessCredential;

/// Namespace under which Hasura places its session claims.
pub const HASURA_CLAIMS_NAMESPACE: &str = "https://hasura.io/jwt/claims";

/// Identity claims decoded from an access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedClaims {
    /// Expiry, in seconds since the Unix epoch.
    pub expires_at: i64,
    /// Server-side session identifier.
    pub session_id: Option<String>,
    /// User identifier.
    pub user_id: String,
    /// Organization the user belongs to.
    pub organization_id: Option<String>,
    /// Role used when a request does not select one.
    pub default_role: String,
    /// Roles the user may select.
    pub allowed_roles: BTreeSet<String>,
}

impl DecodedClaims {
    /// Returns the expiry as a timestamp, if it is representable.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Returns true if the credential had expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now.timestamp()
    }
}

/// Decodes JWT payloads into [`DecodedClaims`].
///
/// The decoder is configured with the namespace holding the identity claims;
/// it defaults to [`HASURA_CLAIMS_NAMESPACE`].
#[derive(Debug, Clone)]
pub struct ClaimsDecoder {
    namespace: String,
}

impl Default for ClaimsDecoder {
    fn default() -> Self {
        Self::new(HASURA_CLAIMS_NAMESPACE)
    }
}

impl ClaimsDecoder {
    /// Create a decoder reading identity claims from `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Returns the configured claims namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Decode the identity claims carried by an access credential.
    ///
    /// # Errors
    ///
    /// Fails with [`MalformedCredential`] if the payload cannot be decoded or
    /// the claims namespace is absent. Callers treat this as "no valid
    /// identity".
    pub fn decode(&self, credential: &AccessCredential) -> Result<DecodedClaims, MalformedCredential> {
        let payload = decode_payload(credential.as_str())?;
        let expires_at = read_expiry(&payload)?;

        let namespaced = payload
            .get(&self.namespace)
            .ok_or_else(|| MalformedCredential::MissingNamespace(self.namespace.clone()))?;

        // Hasura may be configured to emit the namespace as a JSON string.
        let claims: HasuraClaims = match namespaced {
            Value::String(encoded) => serde_json::from_str(encoded),
            other => serde_json::from_value(other.clone()),
        }
        .map_err(|e| MalformedCredential::Payload(e.to_string()))?;

        Ok(DecodedClaims {
            expires_at,
            session_id: claims.session_id.map(String::from),
            user_id: claims.user_id.into(),
            organization_id: claims.organization_id.map(String::from),
            default_role: claims.default_role,
            allowed_roles: claims.allowed_roles,
        })
    }

    /// Read only the `exp` claim of any credential.
    ///
    /// Used on refresh credentials, which carry no identity namespace.
    pub fn expiry(&self, credential: &str) -> Result<i64, MalformedCredential> {
        read_expiry(&decode_payload(credential)?)
    }
}

#[derive(Debug, Deserialize)]
struct HasuraClaims {
    #[serde(rename = "x-hasura-allowed-roles")]
    allowed_roles: BTreeSet<String>,
    #[serde(rename = "x-hasura-default-role")]
    default_role: String,
    #[serde(rename = "x-hasura-user-id")]
    user_id: ClaimId,
    #[serde(rename = "x-hasura-organization-id", default)]
    organization_id: Option<ClaimId>,
    #[serde(rename = "x-hasura-session-id", default)]
    session_id: Option<ClaimId>,
}

/// Identifier claims arrive as strings or bare numbers depending on the issuer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaimId {
    Text(String),
    Number(serde_json::Number),
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> Self {
        match id {
            ClaimId::Text(s) => s,
            ClaimId::Number(n) => n.to_string(),
        }
    }
}

fn decode_payload(credential: &str) -> Result<Value, MalformedCredential> {
    let mut segments = credential.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(MalformedCredential::Shape),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| MalformedCredential::Encoding(e.to_string()))?;

    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| MalformedCredential::Payload(e.to_string()))?;

    if !value.is_object() {
        return Err(MalformedCredential::Payload(
            "payload is not a JSON object".to_string(),
        ));
    }

    Ok(value)
}

fn read_expiry(payload: &Value) -> Result<i64, MalformedCredential> {
    let exp = payload
        .get("exp")
        .and_then(Value::as_f64)
        .map(|exp| exp.floor() as i64)
        .ok_or_else(|| MalformedCredential::Payload("missing numeric 'exp' claim".to_string()))?;

    if DateTime::from_timestamp(exp, 0).is_none() {
        return Err(MalformedCredential::Payload(
            "'exp' claim is out of range".to_string(),
        ));
    }

    Ok(exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    fn hasura_payload(exp: i64) -> Value {
        json!({
            "exp": exp,
            HASURA_CLAIMS_NAMESPACE: {
                "x-hasura-allowed-roles": ["user", "admin"],
                "x-hasura-default-role": "user",
                "x-hasura-user-id": "u-1",
                "x-hasura-organization-id": "org-9",
                "x-hasura-session-id": "s-42"
            }
        })
    }

    #[test]
    fn decodes_hasura_claims() {
        let decoder = ClaimsDecoder::default();
        let claims = decoder
            .decode(&AccessCredential::new(token(hasura_payload(1_700_000_000))))
            .unwrap();

        assert_eq!(claims.expires_at, 1_700_000_000);
        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.organization_id.as_deref(), Some("org-9"));
        assert_eq!(claims.session_id.as_deref(), Some("s-42"));
        assert_eq!(claims.default_role, "user");
        assert!(claims.allowed_roles.contains("admin"));
        assert_eq!(claims.allowed_roles.len(), 2);
    }

    #[test]
    fn accepts_numeric_ids_and_optional_fields() {
        let payload = json!({
            "exp": 10,
            HASURA_CLAIMS_NAMESPACE: {
                "x-hasura-allowed-roles": ["user"],
                "x-hasura-default-role": "user",
                "x-hasura-user-id": 17
            }
        });
        let claims = ClaimsDecoder::default()
            .decode(&AccessCredential::new(token(payload)))
            .unwrap();

        assert_eq!(claims.user_id, "17");
        assert_eq!(claims.organization_id, None);
        assert_eq!(claims.session_id, None);
    }

    #[test]
    fn accepts_stringified_namespace() {
        let inner = json!({
            "x-hasura-allowed-roles": ["user"],
            "x-hasura-default-role": "user",
            "x-hasura-user-id": "u-2"
        });
        let payload = json!({ "exp": 10, HASURA_CLAIMS_NAMESPACE: inner.to_string() });
        let claims = ClaimsDecoder::default()
            .decode(&AccessCredential::new(token(payload)))
            .unwrap();

        assert_eq!(claims.user_id, "u-2");
    }

    #[test]
    fn tolerates_padded_payload() {
        let raw = token(hasura_payload(5));
        let mut parts: Vec<String> = raw.split('.').map(str::to_string).collect();
        while parts[1].len() % 4 != 0 {
            parts[1].push('=');
        }
        let padded = parts.join(".");

        assert_eq!(ClaimsDecoder::default().expiry(&padded).unwrap(), 5);
    }

    #[test]
    fn missing_namespace_is_malformed() {
        let decoder = ClaimsDecoder::default();
        let err = decoder
            .decode(&AccessCredential::new(token(json!({ "exp": 10 }))))
            .unwrap_err();
        assert!(matches!(err, MalformedCredential::MissingNamespace(_)));
    }

    #[test]
    fn custom_namespace_is_honoured() {
        let decoder = ClaimsDecoder::new("https://example.com/claims");
        let err = decoder
            .decode(&AccessCredential::new(token(hasura_payload(10))))
            .unwrap_err();
        assert!(matches!(err, MalformedCredential::MissingNamespace(ns) if ns == "https://example.com/claims"));
    }

    #[test]
    fn rejects_garbage() {
        let decoder = ClaimsDecoder::default();
        assert!(matches!(decoder.expiry("not-a-jwt"), Err(MalformedCredential::Shape)));
        assert!(matches!(decoder.expiry("a.!!!.c"), Err(MalformedCredential::Encoding(_))));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(matches!(decoder.expiry(&not_json), Err(MalformedCredential::Payload(_))));
    }

    #[test]
    fn expiry_only_needs_exp() {
        let refresh = token(json!({ "exp": 1234, "sub": "u-1" }));
        assert_eq!(ClaimsDecoder::default().expiry(&refresh).unwrap(), 1234);

        let no_exp = token(json!({ "sub": "u-1" }));
        assert!(ClaimsDecoder::default().expiry(&no_exp).is_err());
    }

    #[test]
    fn out_of_range_expiry_is_malformed() {
        let decoder = ClaimsDecoder::default();
        let mut payload = hasura_payload(0);
        payload["exp"] = json!(1e300);

        let err = decoder
            .decode(&AccessCredential::new(token(payload.clone())))
            .unwrap_err();
        assert!(matches!(err, MalformedCredential::Payload(_)));
        assert!(decoder.expiry(&token(payload)).is_err());
    }

    #[test]
    fn expiry_comparison_is_strict() {
        let claims = ClaimsDecoder::default()
            .decode(&AccessCredential::new(token(hasura_payload(100))))
            .unwrap();
        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap();

        assert!(!claims.is_expired_at(at(100)));
        assert!(claims.is_expired_at(at(101)));
        assert_eq!(claims.expiry(), Some(at(100)));
    }
}
