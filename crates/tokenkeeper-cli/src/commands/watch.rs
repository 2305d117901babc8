//! Watch command implementation.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use tokenkeeper_core::{SessionManager, SessionState, project};

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Output state changes as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WatchArgs, config: &Config) -> Result<()> {
    let session = config.session()?;
    let mut states = session.subscribe();

    eprintln!("{}", "Watching session. Press Ctrl+C to stop.".dimmed());
    eprintln!();

    session.start().await;
    let state = states.borrow_and_update().clone();
    print_state(&session, &state, args.json)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print_state(&session, &state, args.json)?;
            }
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

fn print_state(session: &SessionManager, state: &SessionState, json: bool) -> Result<()> {
    let now = Utc::now();
    let next_renewal = session.next_renewal_at();

    if json {
        return output::json(&json!({
            "at": now,
            "status": state.status().to_string(),
            "user": project(state),
            "error": state.error().map(ToString::to_string),
            "nextRenewalAt": next_renewal,
        }));
    }

    let stamp = now.format("%H:%M:%S").to_string();
    match state {
        SessionState::Authenticated { .. } => {
            let user = project(state).map(|u| u.user_id).unwrap_or_default();
            let renewal = next_renewal
                .map(|at| format!(", renews at {}", at.format("%H:%M:%S")))
                .unwrap_or_default();
            println!("{} {} {}{}", stamp.dimmed(), "authenticated".green(), user, renewal);
        }
        SessionState::Error { cause } => {
            println!("{} {} {}", stamp.dimmed(), "error".red(), cause);
            output::error(output::SESSION_PROBLEM);
        }
        other => println!("{} {}", stamp.dimmed(), other.status().to_string().yellow()),
    }

    Ok(())
}
