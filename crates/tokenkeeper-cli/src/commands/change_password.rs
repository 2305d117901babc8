//! Change-password command implementation.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct ChangePasswordArgs {
    /// The new password
    #[arg(long)]
    pub new_password: String,
}

pub async fn run(args: ChangePasswordArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    super::start(&session).await?;

    session.change_password(&args.new_password).await?;
    output::success("Password changed");

    Ok(())
}
