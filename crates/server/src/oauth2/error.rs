use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use todo_types::oauth2::OAuth2ErrorResponse;

use super::server::GrantType;
use crate::database::DataError;

/// Protocol-level errors rendered as RFC 6749 error bodies.
#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid client")]
    InvalidClient,
    #[error("invalid grant")]
    InvalidGrant,
    #[error("unauthorized client: {0}")]
    UnauthorizedClient(String),
    #[error("unsupported grant type")]
    UnsupportedGrantType,
    #[error("unsupported response type: {0}")]
    UnsupportedResponseType(String),
    #[error("invalid scope")]
    InvalidScope,
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("server error: {0}")]
    ServerError(String),
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("expired access token")]
    ExpiredAccessToken,
}

impl OAuth2Error {
    pub fn code(&self) -> &'static str {
        match self {
            OAuth2Error::InvalidRequest(_) => "invalid_request",
            OAuth2Error::InvalidClient => "invalid_client",
            OAuth2Error::InvalidGrant => "invalid_grant",
            OAuth2Error::UnauthorizedClient(_) => "unauthorized_client",
            OAuth2Error::UnsupportedGrantType => "unsupported_grant_type",
            OAuth2Error::UnsupportedResponseType(_) => "unsupported_response_type",
            OAuth2Error::InvalidScope => "invalid_scope",
            OAuth2Error::AccessDenied(_) => "access_denied",
            OAuth2Error::ServerError(_) => "server_error",
            OAuth2Error::InvalidAccessToken => "invalid_access_token",
            OAuth2Error::ExpiredAccessToken => "expired_access_token",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OAuth2Error::InvalidClient
            | OAuth2Error::UnauthorizedClient(_)
            | OAuth2Error::AccessDenied(_)
            | OAuth2Error::InvalidAccessToken
            | OAuth2Error::ExpiredAccessToken => StatusCode::UNAUTHORIZED,
            OAuth2Error::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn description(&self) -> Option<String> {
        match self {
            OAuth2Error::InvalidRequest(d)
            | OAuth2Error::UnauthorizedClient(d)
            | OAuth2Error::UnsupportedResponseType(d)
            | OAuth2Error::AccessDenied(d) => Some(d.clone()),
            // Internal details stay in the logs.
            OAuth2Error::ServerError(_) => Some("Internal error".to_string()),
            _ => None,
        }
    }

    pub fn to_body(&self) -> OAuth2ErrorResponse {
        OAuth2ErrorResponse {
            error: self.code().to_string(),
            error_description: self.description(),
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Why one of the authorization callbacks said no.
#[derive(Debug, Error)]
pub enum AuthorizationFailure {
    #[error("invalid grant type: {0}")]
    GrantNotAllowed(GrantType),
    #[error("client not authorized for implicit grants")]
    ImplicitNotAllowed,
    #[error("not authorized for scope")]
    ScopeDenied,
    #[error("no such oauth2 client")]
    ClientNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("user is banned")]
    UserBanned,
    #[error("no scope information found")]
    NoScopeInformation,
    #[error("fetching oauth2 client: {0}")]
    Store(DataError),
}

impl AuthorizationFailure {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthorizationFailure::NoScopeInformation => StatusCode::BAD_REQUEST,
            AuthorizationFailure::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Lookups that found nothing mean the client doesn't exist; everything
    /// else from the store is an internal failure.
    pub fn from_lookup(err: DataError) -> Self {
        if err.is_not_found() {
            AuthorizationFailure::ClientNotFound
        } else {
            AuthorizationFailure::Store(err)
        }
    }

    /// Protocol error reported to the OAuth2 caller for this failure.
    pub fn into_oauth2_error(self) -> OAuth2Error {
        match self {
            AuthorizationFailure::Store(err) => OAuth2Error::ServerError(err.to_string()),
            AuthorizationFailure::ScopeDenied | AuthorizationFailure::NoScopeInformation => {
                OAuth2Error::InvalidScope
            }
            AuthorizationFailure::ClientNotFound => OAuth2Error::InvalidClient,
            AuthorizationFailure::UserNotFound | AuthorizationFailure::UserBanned => {
                OAuth2Error::AccessDenied(self.to_string())
            }
            AuthorizationFailure::GrantNotAllowed(_) | AuthorizationFailure::ImplicitNotAllowed => {
                OAuth2Error::UnauthorizedClient(self.to_string())
            }
        }
    }
}

impl IntoResponse for AuthorizationFailure {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthorizationFailure::Store(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (
            status,
            Json(todo_types::ErrorResponse::new(message, status.as_u16())),
        )
            .into_response()
    }
}
