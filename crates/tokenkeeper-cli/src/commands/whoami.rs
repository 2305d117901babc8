//! Whoami command implementation.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Output the user as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    super::start(&session).await?;

    match session.current_user() {
        Some(user) if args.json => output::json_pretty(&user)?,
        Some(user) => output::user(&user),
        None => println!("Not logged in"),
    }

    Ok(())
}
