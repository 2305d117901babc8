//! CLI tests against an isolated credential store.
//!
//! Offline tests point the CLI at an endpoint nothing listens on; the rest
//! use wiremock to stand in for the GraphQL server. Each test gets its own
//! temporary store directory.

mod common;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

fn endpoint(server: &MockServer) -> String {
    format!("{}/v1/graphql", server.uri())
}

// ============================================================================
// Offline
// ============================================================================

#[test]
fn test_whoami_without_session() {
    let dir = TempDir::new().unwrap();

    let stdout = run_cli_success(&["whoami"], dir.path(), Some(OFFLINE_ENDPOINT));

    assert!(stdout.contains("Not logged in"));
}

#[test]
fn test_whoami_with_expired_refresh_token() {
    let dir = TempDir::new().unwrap();
    seed_refresh_token(dir.path(), &refresh_token(now() - 60));

    let stdout = run_cli_success(&["whoami"], dir.path(), Some(OFFLINE_ENDPOINT));

    assert!(stdout.contains("Not logged in"));
    assert_eq!(stored_refresh_token(dir.path()), None);
}

#[test]
fn test_logout_clears_store_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    seed_refresh_token(dir.path(), &refresh_token(now() + 3600));

    run_cli_success(&["logout"], dir.path(), Some(OFFLINE_ENDPOINT));
    assert!(!dir.path().join("credentials.json").exists());

    let stdout = run_cli_success(&["logout"], dir.path(), Some(OFFLINE_ENDPOINT));
    assert!(stdout.contains("Logged out"));
}

#[test]
fn test_change_password_requires_login() {
    let dir = TempDir::new().unwrap();

    let stderr = run_cli_failure(
        &["change-password", "--new-password", "fresh"],
        dir.path(),
        Some(OFFLINE_ENDPOINT),
    );

    assert!(stderr.contains("not authenticated"));
}

#[test]
fn test_missing_endpoint() {
    let dir = TempDir::new().unwrap();

    let stderr = run_cli_failure(&["whoami"], dir.path(), None);

    assert!(stderr.contains("TOKENKEEPER_ENDPOINT"));
}

#[test]
fn test_insecure_endpoint_rejected() {
    let dir = TempDir::new().unwrap();

    let stderr = run_cli_failure(
        &["whoami"],
        dir.path(),
        Some("http://api.example.com/v1/graphql"),
    );

    assert!(stderr.contains("Invalid endpoint URL"));
}

#[test]
fn test_unreachable_endpoint_reports_session_problem() {
    let dir = TempDir::new().unwrap();
    let token = refresh_token(now() + 3600);
    seed_refresh_token(dir.path(), &token);

    let stderr = run_cli_failure(&["whoami"], dir.path(), Some(OFFLINE_ENDPOINT));

    assert!(stderr.contains("There's a problem with your session. Try again later."));
    assert_eq!(stored_refresh_token(dir.path()), Some(token));
}

// ============================================================================
// Against a mock endpoint
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_whoami() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let refresh = refresh_token(now() + 30 * 24 * 3600);

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_partial_json(json!({
            "variables": { "email": "alice@example.com", "password": "secret123" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "auth_login": {
                    "access_token": access_token("u-1"),
                    "refresh_token": refresh,
                    "organization_id": "org-1",
                    "user_id": "u-1"
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_partial_json(json!({
            "variables": { "refresh_token": refresh }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "auth_refresh_token": { "access_token": access_token("u-1") } }
        })))
        .mount(&server)
        .await;

    let url = endpoint(&server);
    let stdout = run_cli_success(
        &["login", "--email", "alice@example.com", "--password", "secret123"],
        dir.path(),
        Some(&url),
    );
    assert!(stdout.contains("Logged in successfully"));
    assert!(stdout.contains("u-1"));
    assert_eq!(stored_refresh_token(dir.path()), Some(refresh.clone()));

    let stdout = run_cli_success(&["whoami", "--json"], dir.path(), Some(&url));
    let user: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(user["userId"], "u-1");
    assert_eq!(user["organizationId"], "org-1");
    assert_eq!(user["allowedRoles"], json!(["manager", "user"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_failure_shows_server_message() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Invalid 'email' or 'password'" }]
        })))
        .mount(&server)
        .await;

    let url = endpoint(&server);
    let stderr = run_cli_failure(
        &["login", "--email", "alice@example.com", "--password", "wrong"],
        dir.path(),
        Some(&url),
    );

    assert!(stderr.contains("Invalid 'email' or 'password'"));
    assert!(!dir.path().join("credentials.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_refresh_token_logs_out() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    seed_refresh_token(dir.path(), &refresh_token(now() + 3600));

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Invalid 'refresh_token' or 'user_id'" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = endpoint(&server);
    let stdout = run_cli_success(&["whoami"], dir.path(), Some(&url));

    assert!(stdout.contains("Not logged in"));
    assert_eq!(stored_refresh_token(dir.path()), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_register_forbidden_message() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "message": "Forbidden",
                "extensions": { "code": "access-denied" }
            }]
        })))
        .mount(&server)
        .await;

    let url = endpoint(&server);
    let stderr = run_cli_failure(
        &["register", "--email", "bob@example.com", "--password", "hunter22"],
        dir.path(),
        Some(&url),
    );

    assert!(stderr.contains("Registration is disabled for guest users"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_is_authorized() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let refresh = refresh_token(now() + 3600);
    let access = access_token("u-7");
    seed_refresh_token(dir.path(), &refresh);

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_partial_json(json!({
            "variables": { "refresh_token": refresh }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "auth_refresh_token": { "access_token": access } }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .and(header("x-hasura-role", "manager"))
        .and(body_partial_json(json!({ "variables": { "limit": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "projects": [{ "name": "apollo" }] }
        })))
        .mount(&server)
        .await;

    let url = endpoint(&server);
    let stdout = run_cli_success(
        &[
            "--role",
            "manager",
            "query",
            "query projects($limit: Int) { projects(limit: $limit) { name } }",
            "--variables",
            r#"{"limit": 1}"#,
        ],
        dir.path(),
        Some(&url),
    );

    let data: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(data["projects"][0]["name"], "apollo");
}
