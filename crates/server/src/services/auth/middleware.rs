use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use todo_types::users::UserLoginInput;

use super::Service;
use crate::api::input::attach_input;
use crate::context::{AttachedClient, SessionInfo};
use crate::database::DataError;
use crate::error::ApiError;

/// Attaches a [`SessionInfo`] (and, for bearer tokens, the
/// [`AttachedClient`]) when the request can be tied to a user. Requests that
/// can't are passed on unchanged.
#[tracing::instrument(skip_all)]
pub async fn user_attribution_middleware(
    State(service): State<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    if let Some(token) = service.session_token(&parts.headers) {
        match service.session_data_manager.get_session(&token).await {
            Ok(session) => match service.user_data_manager.get_user(session.user_id).await {
                Ok(user) => {
                    parts.extensions.insert(SessionInfo::from(&user));
                    return next.run(Request::from_parts(parts, body)).await;
                }
                Err(DataError::NotFound) => {
                    tracing::debug!(user_id = session.user_id, "session for missing user");
                }
                Err(e) => return ApiError::from(e).into_response(),
            },
            Err(DataError::NotFound) => tracing::debug!("no session for cookie"),
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    match service
        .oauth2_client_validator
        .extract_oauth2_client_from_request(&parts)
        .await
    {
        Ok(client) => match service
            .user_data_manager
            .get_user(client.belongs_to_user)
            .await
        {
            Ok(user) => {
                parts.extensions.insert(SessionInfo::from(&user));
                parts.extensions.insert(AttachedClient(client));
            }
            Err(DataError::NotFound) => {
                tracing::debug!(client_id = %client.client_id, "client owner no longer exists");
            }
            Err(e) => return ApiError::from(e).into_response(),
        },
        Err(e) => tracing::debug!(error = %e, "no oauth2 client for request"),
    }

    next.run(Request::from_parts(parts, body)).await
}

/// 401 without an attributed user, 403 when that user is banned.
#[tracing::instrument(skip_all)]
pub async fn authorization_middleware(req: Request, next: Next) -> Response {
    match req.extensions().get::<SessionInfo>() {
        None => {
            tracing::debug!("no session info attached to request");
            ApiError::unauthorized().into_response()
        }
        Some(session) if session.is_banned() => {
            tracing::info!(user_id = session.user_id, "banned user rejected");
            ApiError::Forbidden("account is banned".to_string()).into_response()
        }
        Some(_) => next.run(req).await,
    }
}

/// 401 unless the attributed user is an admin.
#[tracing::instrument(skip_all)]
pub async fn admin_middleware(req: Request, next: Next) -> Response {
    match req.extensions().get::<SessionInfo>() {
        Some(session) if session.user_is_admin => next.run(req).await,
        _ => ApiError::unauthorized().into_response(),
    }
}

/// 401 unless the session cookie is present at all.
pub async fn cookie_requirement_middleware(
    State(service): State<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    if service.session_token(req.headers()).is_none() {
        return ApiError::unauthorized().into_response();
    }
    next.run(req).await
}

pub(super) async fn login_input_middleware(
    State(service): State<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    let auth = service.auth_config().clone();
    attach_input::<UserLoginInput, _>(req, next, move |input| {
        input.validate_with(auth.minimum_username_length, auth.minimum_password_length)
    })
    .await
}
