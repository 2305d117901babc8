//! Login command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use tokenkeeper_core::Credentials;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let credentials = Credentials::new(args.email, args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let user = session.login(&credentials).await?;

    output::success("Logged in successfully");
    println!();
    output::user(&user);

    Ok(())
}
