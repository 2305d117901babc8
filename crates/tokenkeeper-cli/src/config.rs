//! Endpoint, role and storage settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use directories::ProjectDirs;

use tokenkeeper_core::{EndpointUrl, SessionManager};
use tokenkeeper_file::FileStore;
use tokenkeeper_graphql::{AuthorizedClient, GraphqlAuth};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// GraphQL endpoint serving the auth mutations and application data
    #[arg(long, env = "TOKENKEEPER_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Role sent with authorized requests
    #[arg(long, env = "TOKENKEEPER_ROLE", default_value = "user", global = true)]
    pub role: String,

    /// Directory holding the persisted refresh credential
    #[arg(long, env = "TOKENKEEPER_STORE_DIR", global = true)]
    pub store_dir: Option<PathBuf>,
}

/// Resolved settings shared by every command.
///
/// One store instance backs both the session and the data client, so the
/// access credential held in memory is visible to both.
pub struct Config {
    endpoint: Option<String>,
    role: String,
    store: Arc<FileStore>,
}

impl Config {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let store_dir = match args.store_dir {
            Some(dir) => dir,
            None => default_store_dir()?,
        };
        tracing::debug!(store_dir = %store_dir.display(), "Using credential store");

        Ok(Self {
            endpoint: args.endpoint,
            role: args.role,
            store: Arc::new(FileStore::new(store_dir)),
        })
    }

    fn endpoint(&self) -> Result<EndpointUrl> {
        let endpoint = self
            .endpoint
            .as_deref()
            .context("No endpoint configured. Pass --endpoint or set TOKENKEEPER_ENDPOINT.")?;
        EndpointUrl::new(endpoint).context("Invalid endpoint URL")
    }

    /// Build the process's session manager.
    pub fn session(&self) -> Result<SessionManager> {
        let backend = GraphqlAuth::new(self.endpoint()?, &self.role)?;
        Ok(SessionManager::builder(self.store.clone(), Arc::new(backend)).build())
    }

    /// Build a client for application requests.
    pub fn data_client(&self) -> Result<AuthorizedClient> {
        Ok(AuthorizedClient::new(
            self.endpoint()?,
            self.store.clone(),
            &self.role,
        )?)
    }
}

fn default_store_dir() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "tokenkeeper").context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
