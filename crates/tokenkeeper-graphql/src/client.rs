//! GraphQL-over-HTTP client.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use tokenkeeper_core::error::{
    Error, InvalidInputError, MalformedCredential, ServerError, TransportError,
};
use tokenkeeper_core::{AccessCredential, EndpointUrl, Result};

use crate::operations::{GraphqlRequest, GraphqlResponse};

/// Header carrying the role a request is made under.
pub const ROLE_HEADER: &str = "x-hasura-role";

/// HTTP client for a single GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    endpoint: EndpointUrl,
}

impl GraphqlClient {
    /// Create a new client for `endpoint`.
    pub fn new(endpoint: EndpointUrl) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tokenkeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self { client, endpoint })
    }

    /// Returns the endpoint this client posts to.
    pub fn endpoint(&self) -> &EndpointUrl {
        &self.endpoint
    }

    /// Execute an operation and decode its `data` member.
    #[instrument(skip(self, variables, headers), fields(endpoint = %self.endpoint))]
    pub async fn execute<V, R>(&self, query: &str, variables: &V, headers: HeaderMap) -> Result<R>
    where
        V: Serialize,
        R: DeserializeOwned,
    {
        debug!(operation = operation_name(query), "GraphQL request");

        let response = self
            .client
            .post(self.endpoint.as_str())
            .headers(headers)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(transport)?;

        self.handle_response(response).await
    }

    /// Decode the `{data, errors}` envelope.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "GraphQL response");

        let body = response.bytes().await.map_err(transport)?;
        let envelope = match serde_json::from_slice::<GraphqlResponse>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Http {
                    status: status.as_u16(),
                }
                .into());
            }
            Err(err) => return Err(invalid_response(err)),
        };

        if let Some(error) = envelope.errors.into_iter().next() {
            debug!(message = %error.message, "GraphQL error");
            let code = error.extensions.and_then(|ext| ext.code);
            return Err(ServerError::new(error.message, code).into());
        }

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
            }
            .into());
        }

        match envelope.data {
            Some(data) if !data.is_null() => serde_json::from_value(data).map_err(invalid_response),
            _ => Err(TransportError::InvalidResponse {
                message: "response has no data".to_string(),
            }
            .into()),
        }
    }
}

/// Build the headers of an authorized request.
pub(crate) fn auth_headers(credential: &AccessCredential, role: &HeaderValue) -> Result<HeaderMap> {
    let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.as_str()))
        .map_err(|_| MalformedCredential::HeaderValue)?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(HeaderName::from_static(ROLE_HEADER), role.clone());
    Ok(headers)
}

/// Validate a role name as a header value.
pub(crate) fn role_header(role: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(role).map_err(|_| {
        InvalidInputError::Role {
            value: role.to_string(),
        }
        .into()
    })
}

fn transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        TransportError::Timeout.into()
    } else if err.is_decode() {
        invalid_response(err)
    } else {
        TransportError::Connection {
            message: err.to_string(),
        }
        .into()
    }
}

fn invalid_response(err: impl std::fmt::Display) -> Error {
    TransportError::InvalidResponse {
        message: err.to_string(),
    }
    .into()
}

/// The operation keyword and name, for logs.
fn operation_name(query: &str) -> &str {
    let query = query.trim_start();
    let end = query.find(['(', '{']).unwrap_or(query.len());
    query[..end].trim_end()
}
