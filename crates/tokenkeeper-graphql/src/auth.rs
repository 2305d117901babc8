//! GraphQL-backed authentication endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use tokenkeeper_core::error::Error;
use tokenkeeper_core::traits::{AuthBackend, LoginOutput, RefreshClient};
use tokenkeeper_core::{AccessCredential, Credentials, EndpointUrl, RefreshCredential, Result};

use crate::client::{GraphqlClient, auth_headers, role_header};
use crate::operations::{
    CHANGE_PASSWORD, ChangePasswordData, ChangePasswordVariables, EmailPassword,
    INVALID_REFRESH_MESSAGE, LOGIN, LoginData, REFRESH_TOKEN, REGISTER, RefreshTokenData,
    RefreshTokenVariables, RegisterData,
};

/// The `auth_*` mutation family served by a GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlAuth {
    client: GraphqlClient,
    role: HeaderValue,
}

impl GraphqlAuth {
    /// Create an endpoint client. `role` is sent with authorized requests.
    pub fn new(endpoint: EndpointUrl, role: &str) -> Result<Self> {
        Ok(Self {
            client: GraphqlClient::new(endpoint)?,
            role: role_header(role)?,
        })
    }

    /// Returns the underlying GraphQL client.
    pub fn client(&self) -> &GraphqlClient {
        &self.client
    }
}

#[async_trait]
impl RefreshClient for GraphqlAuth {
    #[instrument(skip(self, refresh_credential))]
    async fn refresh(&self, refresh_credential: &RefreshCredential) -> Result<AccessCredential> {
        let variables = RefreshTokenVariables {
            refresh_token: refresh_credential.as_str(),
        };

        let data: RefreshTokenData = self
            .client
            .execute(REFRESH_TOKEN, &variables, HeaderMap::new())
            .await
            .map_err(|err| match err {
                Error::Server(err) if err.message == INVALID_REFRESH_MESSAGE => {
                    Error::InvalidCredential
                }
                other => other,
            })?;

        debug!("Access credential issued");
        Ok(AccessCredential::new(data.auth_refresh_token.access_token))
    }
}

#[async_trait]
impl AuthBackend for GraphqlAuth {
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutput> {
        let variables = EmailPassword {
            email: credentials.email(),
            password: credentials.password(),
        };

        let data: LoginData = self
            .client
            .execute(LOGIN, &variables, HeaderMap::new())
            .await?;
        let login = data.auth_login;

        Ok(LoginOutput {
            access_credential: AccessCredential::new(login.access_token),
            refresh_credential: RefreshCredential::new(login.refresh_token),
            organization_id: login.organization_id,
            user_id: login.user_id,
        })
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn register(&self, credentials: &Credentials) -> Result<u64> {
        let variables = EmailPassword {
            email: credentials.email(),
            password: credentials.password(),
        };

        let data: RegisterData = self
            .client
            .execute(REGISTER, &variables, HeaderMap::new())
            .await?;

        Ok(data.auth_register.affected_rows)
    }

    #[instrument(skip(self, access_credential, new_password))]
    async fn change_password(
        &self,
        access_credential: &AccessCredential,
        user_id: &str,
        new_password: &str,
    ) -> Result<u64> {
        let variables = ChangePasswordVariables {
            user_id,
            new_password,
        };
        let headers = auth_headers(access_credential, &self.role)?;

        let data: ChangePasswordData = self
            .client
            .execute(CHANGE_PASSWORD, &variables, headers)
            .await?;

        Ok(data.auth_change_password.affected_rows)
    }
}
