//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use tokenkeeper_core::CurrentUser;

/// Shown whenever the session fails in the background.
pub const SESSION_PROBLEM: &str = "There's a problem with your session. Try again later.";

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print the identity of the current user.
pub fn user(user: &CurrentUser) {
    field("User", &user.user_id);
    if let Some(organization) = &user.organization_id {
        field("Organization", organization);
    }
    field("Role", &user.default_role);
    let roles: Vec<&str> = user.allowed_roles.iter().map(String::as_str).collect();
    field("Allowed roles", &roles.join(", "));
    if let Some(session) = &user.session_id {
        field("Session", session);
    }
    field("Expires", &user.expires_at.to_rfc3339());
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
