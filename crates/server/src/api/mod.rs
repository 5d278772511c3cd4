//! HTTP surface: composes every service's router and serves it.
//!
//! - `/users`, `/users/login`, `/users/logout`, `/auth/status` - public
//! - `/oauth2/authorize`, `/oauth2/token` - OAuth2 protocol endpoints
//! - `/api/v1/*` - everything else; needs a session cookie or bearer token
//! - `/_meta_/live`, `/_meta_/ready` - probes
//! - `/api-docs` - Redoc for the generated OpenAPI document

pub mod input;
pub mod openapi;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_redoc::{Redoc, Servable};

use crate::authentication::{Argon2Authenticator, Authenticator};
use crate::config::AppConfig;
use crate::database::Querier;
use crate::oauth2::DbTokenStore;
use crate::services::{
    accounts, admin, api_clients, auth, health, items, oauth2clients, plans, users, webhooks,
};

/// Builds the application router with every service backed by `db`.
pub fn build_router(db: Arc<DatabaseConnection>, config: &AppConfig) -> Router {
    let querier = Arc::new(Querier::new(db.clone()));
    let authenticator: Arc<dyn Authenticator> = Arc::new(Argon2Authenticator);

    let oauth2 = Arc::new(oauth2clients::Service::new(
        config.oauth2.server_config(),
        querier.clone(),
        querier.clone(),
        authenticator.clone(),
        Arc::new(DbTokenStore::new(db)),
    ));
    let auth = Arc::new(auth::Service::new(
        config.cookies.clone(),
        config.auth.clone(),
        querier.clone(),
        querier.clone(),
        authenticator.clone(),
        oauth2.clone(),
    ));
    let users = Arc::new(users::Service::new(
        config.auth.clone(),
        querier.clone(),
        authenticator.clone(),
    ));
    let items = Arc::new(items::Service::new(querier.clone()));
    let webhooks = Arc::new(webhooks::Service::new(querier.clone()));
    let accounts = Arc::new(accounts::Service::new(querier.clone(), querier.clone()));
    let plans = Arc::new(plans::Service::new(querier.clone()));
    let api_clients = Arc::new(api_clients::Service::new(
        querier.clone(),
        querier.clone(),
        authenticator,
    ));
    let admin = Arc::new(admin::Service::new(querier.clone(), querier.clone()));
    let health = Arc::new(health::Service::new(querier));

    let v1 = OpenApiRouter::new()
        .nest("/users", users.api_router())
        .nest("/items", items.router())
        .nest("/webhooks", webhooks.router())
        .nest("/accounts", accounts.router())
        .nest("/plans", plans.router())
        .nest("/api_clients", api_clients.router())
        .nest("/oauth2/clients", oauth2.api_router())
        .nest("/admin", admin.router());

    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest("/api/v1", auth.require_user(v1))
        .nest("/oauth2", auth.attribute_user(oauth2.protocol_router()))
        .merge(auth.router())
        .merge(users.public_router())
        .merge(health.router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Serves `router` on the configured address until the process exits.
#[tracing::instrument(skip_all, fields(addr = %config.listen_address))]
pub async fn serve(router: Router, config: &AppConfig) -> color_eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    tracing::info!("server listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
