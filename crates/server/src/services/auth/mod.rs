//! Cookie sessions, login and logout, and the middleware that decides who
//! is behind a request.
//!
//! A request is attributed to a user by its session cookie first, then by an
//! OAuth2 bearer token whose client holds the scope of the requested path.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::{from_fn, from_fn_with_state};
use utoipa_axum::router::{OpenApiRouter, UtoipaMethodRouter};
use utoipa_axum::routes;

use crate::authentication::Authenticator;
use crate::config::{AuthConfig, CookieConfig};
use crate::database::{SessionDataManager, UserDataManager};
use crate::entity::oauth2_client;
use crate::services::oauth2clients::{self, ClientExtractionError};

mod http_routes;
mod middleware;

pub use middleware::{
    admin_middleware, authorization_middleware, cookie_requirement_middleware,
    user_attribution_middleware,
};

/// Tag for OpenAPI documentation.
pub const AUTH_TAG: &str = "Authentication";

/// Resolves bearer tokens to the OAuth2 client behind them.
#[async_trait]
pub trait OAuth2ClientValidator: Send + Sync {
    async fn extract_oauth2_client_from_request(
        &self,
        parts: &Parts,
    ) -> Result<oauth2_client::Model, ClientExtractionError>;
}

#[async_trait]
impl OAuth2ClientValidator for oauth2clients::Service {
    async fn extract_oauth2_client_from_request(
        &self,
        parts: &Parts,
    ) -> Result<oauth2_client::Model, ClientExtractionError> {
        oauth2clients::Service::extract_oauth2_client_from_request(self, parts).await
    }
}

pub struct Service {
    cookies: CookieConfig,
    auth: AuthConfig,
    user_data_manager: Arc<dyn UserDataManager>,
    session_data_manager: Arc<dyn SessionDataManager>,
    authenticator: Arc<dyn Authenticator>,
    oauth2_client_validator: Arc<dyn OAuth2ClientValidator>,
}

impl Service {
    pub fn new(
        cookies: CookieConfig,
        auth: AuthConfig,
        user_data_manager: Arc<dyn UserDataManager>,
        session_data_manager: Arc<dyn SessionDataManager>,
        authenticator: Arc<dyn Authenticator>,
        oauth2_client_validator: Arc<dyn OAuth2ClientValidator>,
    ) -> Self {
        Self {
            cookies,
            auth,
            user_data_manager,
            session_data_manager,
            authenticator,
            oauth2_client_validator,
        }
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    /// `/users/login`, `/users/logout` and `/auth/status`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        let (schemas, paths, login) = routes!(http_routes::login);
        let login = login.route_layer(from_fn_with_state(
            self.clone(),
            middleware::login_input_middleware,
        ));
        let (logout_schemas, logout_paths, logout) = routes!(http_routes::logout);
        let logout = logout.route_layer(from_fn_with_state(
            self.clone(),
            cookie_requirement_middleware,
        ));
        let (status_schemas, status_paths, status) = routes!(http_routes::status);
        let status = status.route_layer(from_fn_with_state(
            self.clone(),
            user_attribution_middleware,
        ));

        OpenApiRouter::new()
            .routes((schemas, paths, login))
            .routes((logout_schemas, logout_paths, logout))
            .routes((status_schemas, status_paths, status))
            .with_state(self.clone())
    }

    /// Wraps `router` so every route needs an authenticated, unbanned user.
    pub fn require_user<S>(self: &Arc<Self>, router: OpenApiRouter<S>) -> OpenApiRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn(authorization_middleware))
            .layer(from_fn_with_state(self.clone(), user_attribution_middleware))
    }

    /// Attaches the user behind the request, if any, without requiring one.
    pub fn attribute_user<S>(self: &Arc<Self>, router: OpenApiRouter<S>) -> OpenApiRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn_with_state(self.clone(), user_attribution_middleware))
    }

    pub(crate) fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        session_token(headers, &self.cookies.name)
    }

    /// `Set-Cookie` value carrying `token`; a `max_age` of zero expires it.
    pub(crate) fn session_cookie(&self, token: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookies.name,
            token,
            max_age.max(0)
        );
        if self.cookies.secure_only {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Puts [`admin_middleware`] in front of a single route.
pub fn admin_only<S>(route: UtoipaMethodRouter<S>) -> UtoipaMethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let (schemas, paths, method_router) = route;
    (
        schemas,
        paths,
        method_router.route_layer(from_fn(admin_middleware)),
    )
}

fn session_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; todocookie=abc123; lang=en".parse().unwrap(),
        );
        assert_eq!(
            session_token(&headers, "todocookie").as_deref(),
            Some("abc123")
        );
        assert_eq!(session_token(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "todocookie=".parse().unwrap());
        assert_eq!(session_token(&headers, "todocookie"), None);
    }
}
