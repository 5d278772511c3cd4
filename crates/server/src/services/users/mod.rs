//! Registration, two factor secrets, passwords and user administration.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use todo_types::users::{PasswordUpdateInput, TotpSecretRefreshInput, TotpSecretVerificationInput};
use todo_types::users::UserRegistrationInput;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::{attach_input, with_input};
use crate::authentication::Authenticator;
use crate::config::AuthConfig;
use crate::database::UserDataManager;
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const USERS_TAG: &str = "Users";

pub struct Service {
    auth: AuthConfig,
    user_data_manager: Arc<dyn UserDataManager>,
    authenticator: Arc<dyn Authenticator>,
}

impl Service {
    pub fn new(
        auth: AuthConfig,
        user_data_manager: Arc<dyn UserDataManager>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            auth,
            user_data_manager,
            authenticator,
        }
    }

    /// Unauthenticated routes under `/users`.
    pub fn public_router(self: &Arc<Self>) -> OpenApiRouter {
        let (schemas, paths, register) = routes!(http_routes::register);
        let register = register.route_layer(from_fn_with_state(
            self.clone(),
            registration_input_middleware,
        ));

        OpenApiRouter::new()
            .routes((schemas, paths, register))
            .routes(with_input::<TotpSecretVerificationInput, _>(routes!(
                http_routes::verify_totp_secret
            )))
            .with_state(self.clone())
    }

    /// Authenticated routes, nested at `/api/v1/users`.
    pub fn api_router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(admin_only(routes!(http_routes::list_users)))
            .routes(admin_only(routes!(http_routes::search_users)))
            .routes(routes!(http_routes::self_user))
            .routes(routes!(http_routes::read_user, http_routes::archive_user))
            .routes(admin_only(routes!(http_routes::user_audit)))
            .routes(with_input::<TotpSecretRefreshInput, _>(routes!(
                http_routes::new_totp_secret
            )))
            .routes(with_input::<PasswordUpdateInput, _>(routes!(
                http_routes::update_password
            )))
            .with_state(self.clone())
    }
}

async fn registration_input_middleware(
    State(service): State<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    let auth = service.auth.clone();
    attach_input::<UserRegistrationInput, _>(req, next, move |input| {
        input.validate_with(auth.minimum_username_length, auth.minimum_password_length)
    })
    .await
}
