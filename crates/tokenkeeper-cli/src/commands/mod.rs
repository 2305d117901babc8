//! Subcommand implementations.

pub mod change_password;
pub mod login;
pub mod logout;
pub mod query;
pub mod register;
pub mod watch;
pub mod whoami;

use anyhow::{Result, bail};

use tokenkeeper_core::{SessionManager, SessionState};

use crate::cli::Commands;
use crate::config::Config;
use crate::output;

pub async fn handle(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, config).await,
        Commands::Register(args) => register::run(args, config).await,
        Commands::Logout(args) => logout::run(args, config),
        Commands::Whoami(args) => whoami::run(args, config).await,
        Commands::ChangePassword(args) => change_password::run(args, config).await,
        Commands::Watch(args) => watch::run(args, config).await,
        Commands::Query(args) => query::run(args, config).await,
    }
}

/// Initialize the session, failing if renewal went wrong.
///
/// `Anonymous` is not a failure here; commands decide what it means.
pub(crate) async fn start(session: &SessionManager) -> Result<SessionState> {
    let state = session.start().await;
    if let SessionState::Error { cause } = &state {
        output::error(output::SESSION_PROBLEM);
        bail!("{cause}");
    }
    Ok(state)
}
