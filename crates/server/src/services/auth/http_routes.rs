use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use todo_types::ErrorResponse;
use todo_types::users::{UserLoginInput, UserStatusResponse};

use super::{AUTH_TAG, Service};
use crate::authentication::AuthenticationError;
use crate::context::SessionInfo;
use crate::error::ApiError;

#[utoipa::path(
    post,
    path = "/users/login",
    tag = AUTH_TAG,
    operation_id = "Login",
    summary = "Start a cookie session",
    description = "Checks the password and current TOTP code. Banned accounts and accounts \
                   whose two factor secret was never verified are refused.",
    request_body = UserLoginInput,
    responses(
        (status = 202, description = "Logged in; the session cookie is set", body = UserStatusResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account banned or not yet verified", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub(super) async fn login(
    State(service): State<Arc<Service>>,
    input: Option<Extension<UserLoginInput>>,
) -> Result<Response, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let user = match service
        .user_data_manager
        .get_user_by_username(&input.username)
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            tracing::debug!(username = %input.username, "login for unknown user");
            return Err(ApiError::unauthorized());
        }
        Err(e) => return Err(e.into()),
    };

    if user.is_banned() {
        tracing::info!(user_id = user.id, "banned user attempted login");
        return Err(ApiError::Forbidden(format!(
            "account is {}",
            user.status()
        )));
    }

    match service.authenticator.validate_login(
        &user.hashed_password,
        &input.password,
        &user.two_factor_secret,
        &input.totp_token,
    ) {
        Ok(true) => {}
        Ok(false) | Err(AuthenticationError::InvalidTwoFactorCode) => {
            tracing::debug!(user_id = user.id, "invalid credentials provided");
            return Err(ApiError::unauthorized());
        }
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "validating login");
            return Err(ApiError::Internal);
        }
    }

    if !user.two_factor_verified() {
        tracing::debug!(user_id = user.id, "two factor secret not yet verified");
        return Err(ApiError::Forbidden(
            "two factor secret has not been verified".to_string(),
        ));
    }

    let session = service
        .session_data_manager
        .create_session(
            user.id,
            time::Duration::seconds(service.cookies.lifetime_seconds),
        )
        .await?;
    tracing::info!(user_id = user.id, "user logged in");

    let cookie = service.session_cookie(&session.token, service.cookies.lifetime_seconds);
    let status = UserStatusResponse {
        authenticated: true,
        user_is_admin: user.is_admin,
        account_status: Some(user.status()),
    };
    Ok((
        StatusCode::ACCEPTED,
        [(header::SET_COOKIE, cookie)],
        Json(status),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/users/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "End the cookie session",
    responses(
        (status = 202, description = "Logged out; the cookie is expired"),
        (status = 401, description = "No session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub(super) async fn logout(
    State(service): State<Arc<Service>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = service
        .session_token(&headers)
        .ok_or_else(ApiError::unauthorized)?;

    match service.session_data_manager.delete_session(&token).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Err(ApiError::unauthorized()),
        Err(e) => return Err(e.into()),
    }

    Ok((
        StatusCode::ACCEPTED,
        [(header::SET_COOKIE, service.session_cookie("", 0))],
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/auth/status",
    tag = AUTH_TAG,
    operation_id = "Auth Status",
    summary = "Whether the request is authenticated, and as whom",
    responses(
        (status = 200, description = "Authentication status", body = UserStatusResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub(super) async fn status(session: Option<Extension<SessionInfo>>) -> Json<UserStatusResponse> {
    Json(match session {
        Some(Extension(session)) => UserStatusResponse {
            authenticated: true,
            user_is_admin: session.user_is_admin,
            account_status: Some(session.account_status),
        },
        None => UserStatusResponse {
            authenticated: false,
            user_is_admin: false,
            account_status: None,
        },
    })
}
