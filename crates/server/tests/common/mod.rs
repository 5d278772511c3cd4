//! Shared setup for the HTTP integration tests: an in-memory SQLite
//! database with every migration applied, and helpers that drive the
//! registration and login flow.
#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderValue, header};
use axum_test::{TestRequest, TestServer};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use serde_json::json;
use todo_server::authentication::totp;
use todo_server::build_router;
use todo_server::config::AppConfig;
use todo_server::entity::user;
use todo_types::users::UserCreationResponse;

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
}

/// A registered, verified and logged in user.
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub two_factor_secret: String,
    /// `name=value` pair for the `Cookie` header
    pub cookie: String,
}

impl TestUser {
    pub fn totp_code(&self) -> String {
        totp::current_code(&self.two_factor_secret).expect("valid secret")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::with_database_url("sqlite::memory:")).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(1).sqlx_logging(false);
    let db = Arc::new(Database::connect(options).await.expect("connect"));
    Migrator::up(db.as_ref(), None).await.expect("migrate");

    let server = TestServer::new(build_router(db.clone(), &config)).expect("create test server");
    TestApp { server, db }
}

/// Extracts the `name=value` pair from a `Set-Cookie` header.
pub fn session_cookie(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("set-cookie header")
        .to_string()
}

pub fn with_cookie(request: TestRequest, cookie: &str) -> TestRequest {
    request.add_header(
        header::COOKIE,
        HeaderValue::from_str(cookie).expect("cookie header"),
    )
}

pub fn with_bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("authorization header"),
    )
}

impl TestApp {
    pub async fn register(&self, username: &str) -> UserCreationResponse {
        let response = self
            .server
            .post("/users")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    pub async fn verify(&self, created: &UserCreationResponse) {
        let code = totp::current_code(&created.two_factor_secret).expect("valid secret");
        self.server
            .post("/users/totp_secret/verify")
            .json(&json!({ "user_id": created.id, "totp_token": code }))
            .await
            .assert_status(axum::http::StatusCode::ACCEPTED);
    }

    pub async fn login(&self, username: &str, secret: &str) -> axum_test::TestResponse {
        let code = totp::current_code(secret).expect("valid secret");
        self.server
            .post("/users/login")
            .json(&json!({ "username": username, "password": PASSWORD, "totp_token": code }))
            .await
    }

    pub async fn create_user(&self, username: &str) -> TestUser {
        let created = self.register(username).await;
        self.verify(&created).await;
        let response = self.login(username, &created.two_factor_secret).await;
        response.assert_status(axum::http::StatusCode::ACCEPTED);

        TestUser {
            id: created.id,
            username: created.username,
            two_factor_secret: created.two_factor_secret,
            cookie: session_cookie(&response),
        }
    }

    /// Admins are only ever promoted directly in the database.
    pub async fn make_admin(&self, user_id: i32) {
        user::Entity::update_many()
            .col_expr(user::Column::IsAdmin, Expr::value(true))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .expect("promote user");
    }

    pub async fn create_admin(&self, username: &str) -> TestUser {
        let admin = self.create_user(username).await;
        self.make_admin(admin.id).await;
        admin
    }

    /// Creates an OAuth2 client for `owner` and exchanges it for a token.
    pub async fn client_credentials_token(&self, owner: &TestUser, scopes: &[&str]) -> String {
        let response = with_cookie(self.server.post("/api/v1/oauth2/clients"), &owner.cookie)
            .json(&json!({
                "name": "integration",
                "username": owner.username,
                "password": PASSWORD,
                "totp_token": owner.totp_code(),
                "redirect_uri": "https://app.example.com/callback",
                "scopes": scopes,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let client: serde_json::Value = response.json();

        let response = self
            .server
            .post("/oauth2/token")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client["client_id"].as_str().expect("client_id")),
                (
                    "client_secret",
                    client["client_secret"].as_str().expect("client_secret"),
                ),
            ])
            .await;
        response.assert_status_ok();
        let token: serde_json::Value = response.json();
        token["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }
}
