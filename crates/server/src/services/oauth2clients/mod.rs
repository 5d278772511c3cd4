//! OAuth2 client management and the protocol endpoints backed by it.
//!
//! Clients are created by a logged-in user (who re-enters their password and
//! TOTP code) and then exchange their id and secret for bearer tokens at
//! `/oauth2/token`. The engine in [`crate::oauth2`] makes every policy
//! decision through [`ClientAuthorizer`].

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use thiserror::Error;
use todo_types::oauth2_clients::OAuth2ClientCreationInput;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::authentication::Authenticator;
use crate::database::{DataError, OAuth2ClientDataManager, UserDataManager};
use crate::oauth2::{OAuth2Error, OAuth2Handler, OAuth2Server, ServerConfig, TokenStore};
use crate::services::auth::admin_only;

mod client_store;
mod http_routes;
mod implementation;
mod middleware;

pub use client_store::ClientStoreAdapter;
pub use http_routes::determine_scope;
pub use implementation::ClientAuthorizer;
pub use middleware::{oauth2_client_info_middleware, oauth2_token_authentication_middleware};

/// Tag for OpenAPI documentation.
pub const OAUTH2_CLIENTS_TAG: &str = "OAuth2 Clients";
/// Tag for OpenAPI documentation.
pub const OAUTH2_TAG: &str = "OAuth2";

/// Why a bearer token could not be turned into a client.
#[derive(Debug, Error)]
pub enum ClientExtractionError {
    #[error("validating bearer token: {0}")]
    Token(#[from] OAuth2Error),
    #[error("fetching oauth2 client: {0}")]
    Lookup(#[from] DataError),
    #[error("client not authorized for scope {0}")]
    ScopeDenied(String),
}

pub struct Service {
    client_data_manager: Arc<dyn OAuth2ClientDataManager>,
    user_data_manager: Arc<dyn UserDataManager>,
    authenticator: Arc<dyn Authenticator>,
    oauth2_handler: Arc<dyn OAuth2Handler>,
}

impl Service {
    /// Wires the production engine: callbacks, client store adapter and the
    /// given token store.
    pub fn new(
        config: ServerConfig,
        client_data_manager: Arc<dyn OAuth2ClientDataManager>,
        user_data_manager: Arc<dyn UserDataManager>,
        authenticator: Arc<dyn Authenticator>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        let server = OAuth2Server::new(
            config,
            Arc::new(ClientStoreAdapter::new(client_data_manager.clone())),
            token_store,
            Arc::new(ClientAuthorizer::new(client_data_manager.clone())),
        );
        Self::with_handler(
            client_data_manager,
            user_data_manager,
            authenticator,
            Arc::new(server),
        )
    }

    pub fn with_handler(
        client_data_manager: Arc<dyn OAuth2ClientDataManager>,
        user_data_manager: Arc<dyn UserDataManager>,
        authenticator: Arc<dyn Authenticator>,
        oauth2_handler: Arc<dyn OAuth2Handler>,
    ) -> Self {
        Self {
            client_data_manager,
            user_data_manager,
            authenticator,
            oauth2_handler,
        }
    }

    /// Client management, nested at `/api/v1/oauth2/clients`.
    pub fn api_router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_oauth2_clients))
            .routes(with_input::<OAuth2ClientCreationInput, _>(routes!(
                http_routes::create_oauth2_client
            )))
            .routes(routes!(
                http_routes::read_oauth2_client,
                http_routes::archive_oauth2_client
            ))
            .routes(admin_only(routes!(http_routes::oauth2_client_audit)))
            .with_state(self.clone())
    }

    /// Protocol endpoints, nested at `/oauth2`.
    pub fn protocol_router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::authorize, http_routes::authorize_form))
            .routes(routes!(http_routes::token))
            .layer(from_fn_with_state(
                self.clone(),
                oauth2_client_info_middleware,
            ))
            .with_state(self.clone())
    }
}
