//! Registration, two factor verification, login and logout.

mod common;

use axum::http::{StatusCode, header};
use common::{PASSWORD, TestApp, session_cookie, spawn_app, with_cookie};
use serde_json::json;
use todo_server::authentication::totp;
use todo_types::users::{TotpSecretRefreshResponse, User, UserStatusResponse};

async fn status(app: &TestApp, cookie: Option<&str>) -> UserStatusResponse {
    let request = app.server.get("/auth/status");
    let request = match cookie {
        Some(cookie) => with_cookie(request, cookie),
        None => request,
    };
    let response = request.await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_registration_returns_two_factor_secret() {
    let app = spawn_app().await;
    let created = app.register("alice").await;

    assert_eq!(created.username, "alice");
    assert!(!created.two_factor_secret.is_empty());
    assert!(created.two_factor_uri.starts_with("otpauth://totp/"));
    assert!(created.two_factor_uri.contains(&created.two_factor_secret));
}

#[tokio::test]
async fn test_registration_rejects_taken_username_and_short_password() {
    let app = spawn_app().await;
    app.register("alice").await;

    app.server
        .post("/users")
        .json(&json!({ "username": "alice", "password": PASSWORD }))
        .await
        .assert_status_bad_request();

    app.server
        .post("/users")
        .json(&json!({ "username": "bobby", "password": "short" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_login_requires_verified_secret() {
    let app = spawn_app().await;
    let created = app.register("alice").await;

    app.login("alice", &created.two_factor_secret)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.verify(&created).await;
    let response = app.login("alice", &created.two_factor_secret).await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: UserStatusResponse = response.json();
    assert!(body.authenticated);
    assert!(!body.user_is_admin);
}

#[tokio::test]
async fn test_verification_rejects_bad_code_and_repeats() {
    let app = spawn_app().await;
    let created = app.register("alice").await;

    app.server
        .post("/users/totp_secret/verify")
        .json(&json!({ "user_id": created.id, "totp_token": "000000" }))
        .await
        .assert_status_bad_request();

    app.verify(&created).await;

    let code = totp::current_code(&created.two_factor_secret).unwrap();
    app.server
        .post("/users/totp_secret/verify")
        .json(&json!({ "user_id": created.id, "totp_token": code }))
        .await
        .assert_status_bad_request();

    app.server
        .post("/users/totp_secret/verify")
        .json(&json!({ "user_id": 9999, "totp_token": code }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;

    app.server
        .post("/users/login")
        .json(&json!({
            "username": "alice",
            "password": "not the password",
            "totp_token": user.totp_code(),
        }))
        .await
        .assert_status_unauthorized();

    app.server
        .post("/users/login")
        .json(&json!({
            "username": "nobody",
            "password": PASSWORD,
            "totp_token": user.totp_code(),
        }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_status_reflects_session() {
    let app = spawn_app().await;
    assert!(!status(&app, None).await.authenticated);

    let user = app.create_user("alice").await;
    let body = status(&app, Some(&user.cookie)).await;
    assert!(body.authenticated);
    assert!(!body.user_is_admin);

    app.make_admin(user.id).await;
    assert!(status(&app, Some(&user.cookie)).await.user_is_admin);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;

    with_cookie(app.server.get("/api/v1/users/self"), &user.cookie)
        .await
        .assert_status_ok();

    let response = with_cookie(app.server.post("/users/logout"), &user.cookie).await;
    response.assert_status(StatusCode::ACCEPTED);
    let expired = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie");
    assert!(expired.contains("Max-Age=0"));

    with_cookie(app.server.get("/api/v1/users/self"), &user.cookie)
        .await
        .assert_status_unauthorized();
    with_cookie(app.server.post("/users/logout"), &user.cookie)
        .await
        .assert_status_unauthorized();
    app.server.post("/users/logout").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_api_requires_authentication() {
    let app = spawn_app().await;
    app.server.get("/api/v1/items").await.assert_status_unauthorized();
    with_cookie(app.server.get("/api/v1/items"), "todocookie=forged")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_password_change_requires_current_credentials() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;

    with_cookie(app.server.put("/api/v1/users/password/new"), &user.cookie)
        .json(&json!({
            "current_password": "wrong password",
            "totp_token": user.totp_code(),
            "new_password": "an even better password",
        }))
        .await
        .assert_status_unauthorized();

    with_cookie(app.server.put("/api/v1/users/password/new"), &user.cookie)
        .json(&json!({
            "current_password": PASSWORD,
            "totp_token": user.totp_code(),
            "new_password": "an even better password",
        }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    app.login("alice", &user.two_factor_secret)
        .await
        .assert_status_unauthorized();
    let response = app
        .server
        .post("/users/login")
        .json(&json!({
            "username": "alice",
            "password": "an even better password",
            "totp_token": user.totp_code(),
        }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    assert!(session_cookie(&response).starts_with("todocookie="));
}

#[tokio::test]
async fn test_new_totp_secret_must_be_verified_again() {
    let app = spawn_app().await;
    let user = app.create_user("alice").await;

    let response = with_cookie(app.server.post("/api/v1/users/totp_secret/new"), &user.cookie)
        .json(&json!({ "current_password": PASSWORD, "totp_token": user.totp_code() }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let refreshed: TotpSecretRefreshResponse = response.json();
    assert_ne!(refreshed.two_factor_secret, user.two_factor_secret);

    app.login("alice", &refreshed.two_factor_secret)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_users_read_themselves_but_not_others() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;
    let bobby = app.create_user("bobby").await;

    let response = with_cookie(app.server.get("/api/v1/users/self"), &alice.cookie).await;
    response.assert_status_ok();
    let me: User = response.json();
    assert_eq!(me.id, alice.id);

    with_cookie(
        app.server.get(&format!("/api/v1/users/{}", alice.id)),
        &alice.cookie,
    )
    .await
    .assert_status_ok();
    with_cookie(
        app.server.get(&format!("/api/v1/users/{}", bobby.id)),
        &alice.cookie,
    )
    .await
    .assert_status_unauthorized();
    with_cookie(app.server.get("/api/v1/users"), &alice.cookie)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_archived_user_loses_access() {
    let app = spawn_app().await;
    let alice = app.create_user("alice").await;

    with_cookie(
        app.server.delete(&format!("/api/v1/users/{}", alice.id)),
        &alice.cookie,
    )
    .await
    .assert_status(StatusCode::NO_CONTENT);

    with_cookie(app.server.get("/api/v1/users/self"), &alice.cookie)
        .await
        .assert_status_unauthorized();
}
