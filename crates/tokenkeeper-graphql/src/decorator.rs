//! Authorized requests against the data service.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};

use tokenkeeper_core::traits::CredentialStore;
use tokenkeeper_core::{EndpointUrl, Result};

use crate::client::{GraphqlClient, auth_headers, role_header};

/// Executes arbitrary operations under the current access credential.
///
/// The credential is read from the store's volatile scope on every request,
/// so a renewal is picked up without rebuilding the client. Without a held
/// credential the request goes out with no authorization headers.
#[derive(Clone)]
pub struct AuthorizedClient {
    client: GraphqlClient,
    store: Arc<dyn CredentialStore>,
    role: HeaderValue,
}

impl AuthorizedClient {
    /// Create a client for the data service at `endpoint`.
    pub fn new(endpoint: EndpointUrl, store: Arc<dyn CredentialStore>, role: &str) -> Result<Self> {
        Ok(Self {
            client: GraphqlClient::new(endpoint)?,
            store,
            role: role_header(role)?,
        })
    }

    /// Run `query` with `variables` and return its `data` member.
    #[instrument(skip(self, query, variables))]
    pub async fn execute(&self, query: &str, variables: &Value) -> Result<Value> {
        let headers = match self.store.read_access_credential() {
            Some(credential) => auth_headers(&credential, &self.role)?,
            None => {
                debug!("No access credential held; sending anonymous request");
                HeaderMap::new()
            }
        };

        self.client.execute(query, variables, headers).await
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("endpoint", self.client.endpoint())
            .field("role", &self.role)
            .finish()
    }
}
