//! Client-credentials tokens and the `/oauth2` protocol endpoints.

mod common;

use axum::http::StatusCode;
use common::{PASSWORD, spawn_app, spawn_app_with, with_bearer, with_cookie};
use serde_json::json;
use todo_server::authentication::totp;
use todo_server::config::AppConfig;
use todo_server::oauth2::GrantType;
use todo_types::items::{Item, ItemList};
use todo_types::oauth2::OAuth2ErrorResponse;
use todo_types::oauth2_clients::{OAuth2Client, OAuth2ClientList};
use todo_types::users::User;

#[tokio::test]
async fn test_token_grants_access_to_scoped_resources() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;
    let token = app.client_credentials_token(&user, &["items"]).await;

    let response = with_bearer(app.server.post("/api/v1/items"), &token)
        .json(&json!({ "name": "from a script" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let item: Item = response.json();
    assert_eq!(item.belongs_to_user, user.id);

    let list: ItemList = with_bearer(app.server.get("/api/v1/items"), &token)
        .await
        .json();
    assert_eq!(list.items.len(), 1);

    with_bearer(app.server.get("/api/v1/webhooks"), &token)
        .await
        .assert_status_unauthorized();
    with_bearer(app.server.get("/api/v1/users/self"), &token)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_wildcard_scope_reaches_everything() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;
    let token = app.client_credentials_token(&user, &["*"]).await;

    with_bearer(app.server.get("/api/v1/webhooks"), &token)
        .await
        .assert_status_ok();
    let me: User = with_bearer(app.server.get("/api/v1/users/self"), &token)
        .await
        .json();
    assert_eq!(me.id, user.id);
}

#[tokio::test]
async fn test_unknown_bearer_token_is_rejected() {
    let app = spawn_app().await;
    with_bearer(app.server.get("/api/v1/items"), "not-a-token")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_endpoint_errors() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;

    let response = with_cookie(app.server.post("/api/v1/oauth2/clients"), &user.cookie)
        .json(&json!({
            "name": "ci",
            "username": "alice",
            "password": PASSWORD,
            "totp_token": user.totp_code(),
            "scopes": ["items"],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let client: OAuth2Client = response.json();

    let response = app
        .server
        .post("/oauth2/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", "wrong"),
        ])
        .await;
    response.assert_status_unauthorized();
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "invalid_client");

    let response = app
        .server
        .post("/oauth2/token")
        .form(&[
            ("grant_type", "password"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
        ])
        .await;
    response.assert_status_bad_request();
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "unsupported_grant_type");

    let response = app
        .server
        .post("/oauth2/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("scope", "items webhooks"),
        ])
        .await;
    response.assert_status_bad_request();
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "invalid_scope");
}

#[tokio::test]
async fn test_archived_client_tokens_stop_working() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;
    let token = app.client_credentials_token(&user, &["items"]).await;

    let clients: OAuth2ClientList =
        with_cookie(app.server.get("/api/v1/oauth2/clients"), &user.cookie)
            .await
            .json();
    assert_eq!(clients.clients.len(), 1);
    assert!(clients.clients[0].client_secret.is_empty());

    with_cookie(
        app.server
            .delete(&format!("/api/v1/oauth2/clients/{}", clients.clients[0].id)),
        &user.cookie,
    )
    .await
    .assert_status(StatusCode::NO_CONTENT);

    with_bearer(app.server.get("/api/v1/items"), &token)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_client_creation_rejects_someone_elses_credentials() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bobby = app.create_user("bobby").await;

    with_cookie(app.server.post("/api/v1/oauth2/clients"), &alice.cookie)
        .json(&json!({
            "name": "ci",
            "username": "bobby",
            "password": PASSWORD,
            "totp_token": bobby.totp_code(),
            "scopes": ["items"],
        }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_authorize_rejects_unknown_client() {
    let app = spawn_app().await;
    app.server
        .get("/oauth2/authorize")
        .add_query_param("response_type", "token")
        .add_query_param("client_id", "nobody")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_implicit_grant_is_disabled_by_default() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;
    let client: OAuth2Client = with_cookie(app.server.post("/api/v1/oauth2/clients"), &user.cookie)
        .json(&json!({
            "name": "spa",
            "username": "alice",
            "password": PASSWORD,
            "totp_token": user.totp_code(),
            "redirect_uri": "https://app.example.com/callback",
            "scopes": ["items"],
            "implicit_allowed": true,
        }))
        .await
        .json();

    let response = with_cookie(app.server.get("/oauth2/authorize"), &user.cookie)
        .add_query_param("response_type", "token")
        .add_query_param("client_id", &client.client_id)
        .await;
    response.assert_status_unauthorized();
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "unauthorized_client");
}

#[tokio::test]
async fn test_implicit_grant_redirects_with_token() {
    let mut config = AppConfig::with_database_url("sqlite::memory:");
    config.oauth2.allowed_grant_types.push(GrantType::Implicit);
    let app = spawn_app_with(config).await;
    let user = app.create_user("alice").await;
    let client: OAuth2Client = with_cookie(app.server.post("/api/v1/oauth2/clients"), &user.cookie)
        .json(&json!({
            "name": "spa",
            "username": "alice",
            "password": PASSWORD,
            "totp_token": user.totp_code(),
            "redirect_uri": "https://app.example.com/callback",
            "scopes": ["items"],
            "implicit_allowed": true,
        }))
        .await
        .json();

    let response = with_cookie(app.server.get("/oauth2/authorize"), &user.cookie)
        .add_query_param("response_type", "token")
        .add_query_param("client_id", &client.client_id)
        .add_query_param("scope", "items")
        .add_query_param("state", "xyz")
        .await;
    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://app.example.com/callback#"));
    assert!(location.contains("access_token="));
    assert!(location.contains("state=xyz"));
}

async fn implicit_app() -> (common::TestApp, common::TestUser, OAuth2Client) {
    let mut config = AppConfig::with_database_url("sqlite::memory:");
    config.oauth2.allowed_grant_types.push(GrantType::Implicit);
    let app = spawn_app_with(config).await;
    let user = app.create_user("alice").await;
    let client: OAuth2Client = with_cookie(app.server.post("/api/v1/oauth2/clients"), &user.cookie)
        .json(&json!({
            "name": "spa",
            "username": "alice",
            "password": PASSWORD,
            "totp_token": user.totp_code(),
            "redirect_uri": "https://app.example.com",
            "scopes": ["items"],
            "implicit_allowed": true,
        }))
        .await
        .json();
    (app, user, client)
}

#[tokio::test]
async fn test_implicit_grant_via_form_post() {
    let (app, user, client) = implicit_app().await;

    let response = with_cookie(app.server.post("/oauth2/authorize"), &user.cookie)
        .form(&[
            ("response_type", "token"),
            ("client_id", client.client_id.as_str()),
            ("scope", "items"),
            ("state", "abc"),
        ])
        .await;
    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://app.example.com/#"));
    assert!(location.contains("scope=items"));
    assert!(location.contains("state=abc"));

    let response = with_cookie(app.server.post("/oauth2/authorize"), &user.cookie)
        .form(&[
            ("response_type", "token"),
            ("client_id", client.client_id.as_str()),
            ("scope", "webhooks"),
        ])
        .await;
    response.assert_status_bad_request();
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "invalid_scope");

    with_cookie(app.server.post("/oauth2/authorize"), &user.cookie)
        .form(&[("response_type", "token"), ("client_id", "nobody")])
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_authorize_rejects_lookalike_redirect_host() {
    let (app, user, client) = implicit_app().await;

    let response = with_cookie(app.server.get("/oauth2/authorize"), &user.cookie)
        .add_query_param("response_type", "token")
        .add_query_param("client_id", &client.client_id)
        .add_query_param("scope", "items")
        .add_query_param("redirect_uri", "https://app.example.com.evil.io/steal")
        .await;
    response.assert_status_bad_request();
    assert!(response.headers().get("location").is_none());
    let body: OAuth2ErrorResponse = response.json();
    assert_eq!(body.error, "invalid_request");
}

#[tokio::test]
async fn test_client_creation_rejects_wrong_password_or_code() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;

    with_cookie(app.server.post("/api/v1/oauth2/clients"), &alice.cookie)
        .json(&json!({
            "name": "ci",
            "username": "alice",
            "password": "not the password",
            "totp_token": alice.totp_code(),
            "scopes": ["items"],
        }))
        .await
        .assert_status_unauthorized();

    let wrong_code = ["000000", "111111", "222222", "333333"]
        .into_iter()
        .find(|code| !totp::verify_code(&alice.two_factor_secret, code))
        .expect("some code is wrong");
    with_cookie(app.server.post("/api/v1/oauth2/clients"), &alice.cookie)
        .json(&json!({
            "name": "ci",
            "username": "alice",
            "password": PASSWORD,
            "totp_token": wrong_code,
            "scopes": ["items"],
        }))
        .await
        .assert_status_unauthorized();

    with_cookie(app.server.post("/api/v1/oauth2/clients"), &alice.cookie)
        .json(&json!({ "name": "ci" }))
        .await
        .assert_status_bad_request();
}
