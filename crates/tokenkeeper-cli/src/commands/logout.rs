//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, config: &Config) -> Result<()> {
    config.session()?.logout();
    output::success("Logged out");
    Ok(())
}
