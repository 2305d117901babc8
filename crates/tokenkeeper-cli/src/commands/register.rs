//! Register command implementation.

use anyhow::Result;
use clap::Args;

use tokenkeeper_core::Credentials;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Log in with the new account afterwards
    #[arg(long)]
    pub login: bool,
}

pub async fn run(args: RegisterArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let credentials = Credentials::new(args.email, args.password);

    if args.login {
        let user = session.register_and_login(&credentials).await?;
        output::success("Account created and logged in");
        println!();
        output::user(&user);
    } else {
        session.register(&credentials).await?;
        output::success("Account created");
    }

    Ok(())
}
