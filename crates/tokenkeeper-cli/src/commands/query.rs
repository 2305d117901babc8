//! Query command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// GraphQL operation document
    pub query: String,

    /// Operation variables as a JSON object
    #[arg(long, default_value = "{}")]
    pub variables: String,
}

pub async fn run(args: QueryArgs, config: &Config) -> Result<()> {
    let variables: Value =
        serde_json::from_str(&args.variables).context("Variables must be valid JSON")?;

    let session = config.session()?;
    let state = super::start(&session).await?;
    if !state.is_authenticated() {
        eprintln!("{}", "Not logged in; sending an anonymous request.".dimmed());
    }

    let data = config.data_client()?.execute(&args.query, &variables).await?;
    output::json_pretty(&data)
}
