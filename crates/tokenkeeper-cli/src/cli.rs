//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{change_password, login, logout, query, register, watch, whoami};
use crate::config::ConfigArgs;

/// Keep a GraphQL session alive from the command line.
#[derive(Parser, Debug)]
#[command(name = "tokenkeeper")]
#[command(author, version = env!("TOKENKEEPER_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login(login::LoginArgs),

    /// Create a new account
    Register(register::RegisterArgs),

    /// Forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the current user
    Whoami(whoami::WhoamiArgs),

    /// Change the password of the current user
    ChangePassword(change_password::ChangePasswordArgs),

    /// Keep the session alive and print state changes
    Watch(watch::WatchArgs),

    /// Run a GraphQL operation as the current user
    Query(query::QueryArgs),
}
