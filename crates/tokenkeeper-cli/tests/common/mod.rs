#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

/// An endpoint nothing listens on; commands that stay offline never notice.
pub const OFFLINE_ENDPOINT: &str = "http://127.0.0.1:1/v1/graphql";

/// Run the CLI with an isolated credential store and the given endpoint.
pub fn run_cli(args: &[&str], store_dir: &Path, endpoint: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenkeeper"));
    cmd.args(args);
    cmd.env("TOKENKEEPER_STORE_DIR", store_dir);
    cmd.env_remove("TOKENKEEPER_ROLE");
    cmd.env_remove("RUST_LOG");
    match endpoint {
        Some(endpoint) => cmd.env("TOKENKEEPER_ENDPOINT", endpoint),
        None => cmd.env_remove("TOKENKEEPER_ENDPOINT"),
    };
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], store_dir: &Path, endpoint: Option<&str>) -> String {
    let output = run_cli(args, store_dir, endpoint);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure; returns stderr.
pub fn run_cli_failure(args: &[&str], store_dir: &Path, endpoint: Option<&str>) -> String {
    let output = run_cli(args, store_dir, endpoint);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Write a refresh credential into the store the way the CLI persists it.
pub fn seed_refresh_token(store_dir: &Path, token: &str) {
    std::fs::create_dir_all(store_dir).unwrap();
    std::fs::write(
        store_dir.join("credentials.json"),
        json!({ "refresh-token": token }).to_string(),
    )
    .unwrap();
}

pub fn stored_refresh_token(store_dir: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(store_dir.join("credentials.json")).ok()?;
    let entries: serde_json::Value = serde_json::from_str(&raw).ok()?;
    entries["refresh-token"].as_str().map(str::to_string)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

pub fn jwt(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

pub fn access_token(user_id: &str) -> String {
    jwt(json!({
        "exp": now() + 3600,
        "https://hasura.io/jwt/claims": {
            "x-hasura-allowed-roles": ["user", "manager"],
            "x-hasura-default-role": "user",
            "x-hasura-user-id": user_id,
            "x-hasura-organization-id": "org-1"
        }
    }))
}

pub fn refresh_token(exp: i64) -> String {
    jwt(json!({ "exp": exp }))
}
