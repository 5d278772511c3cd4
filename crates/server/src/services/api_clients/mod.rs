//! API clients: named credential pairs a user issues for their own scripts.

use std::sync::Arc;

use todo_types::api_clients::ApiClientCreationInput;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::authentication::Authenticator;
use crate::database::{ApiClientDataManager, UserDataManager};
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const API_CLIENTS_TAG: &str = "API Clients";

pub struct Service {
    api_client_data_manager: Arc<dyn ApiClientDataManager>,
    user_data_manager: Arc<dyn UserDataManager>,
    authenticator: Arc<dyn Authenticator>,
}

impl Service {
    pub fn new(
        api_client_data_manager: Arc<dyn ApiClientDataManager>,
        user_data_manager: Arc<dyn UserDataManager>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            api_client_data_manager,
            user_data_manager,
            authenticator,
        }
    }

    /// Nested at `/api/v1/api_clients`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_api_clients))
            .routes(with_input::<ApiClientCreationInput, _>(routes!(
                http_routes::create_api_client
            )))
            .routes(routes!(
                http_routes::read_api_client,
                http_routes::archive_api_client
            ))
            .routes(admin_only(routes!(http_routes::api_client_audit)))
            .with_state(self.clone())
    }
}
