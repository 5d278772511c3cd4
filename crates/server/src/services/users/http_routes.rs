use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::audit::AuditLogEntry;
use todo_types::items::SearchQuery;
use todo_types::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use todo_types::users::{
    PasswordUpdateInput, TotpSecretRefreshInput, TotpSecretRefreshResponse,
    TotpSecretVerificationInput, User, UserCreationResponse, UserList, UserRegistrationInput,
};
use todo_types::{ErrorResponse, QueryFilter, validation};

use super::{Service, USERS_TAG};
use crate::authentication::{AuthenticationError, totp};
use crate::context::SessionInfo;
use crate::database::{DataError, NewUser};
use crate::entity::user;
use crate::error::ApiError;
use crate::random::random_string;
use crate::services::audit_entries;

impl Service {
    /// Re-checks the requesting user's password and TOTP code.
    async fn reauthenticate(
        &self,
        user_id: i32,
        password: &str,
        totp_token: &str,
    ) -> Result<user::Model, ApiError> {
        let user = self.user_data_manager.get_user(user_id).await?;
        match self.authenticator.validate_login(
            &user.hashed_password,
            password,
            &user.two_factor_secret,
            totp_token,
        ) {
            Ok(true) => Ok(user),
            Ok(false) | Err(AuthenticationError::InvalidTwoFactorCode) => {
                tracing::debug!(user_id, "invalid credentials provided");
                Err(ApiError::unauthorized())
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "validating credentials");
                Err(ApiError::Internal)
            }
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        self.authenticator.hash_password(password).map_err(|e| {
            tracing::error!(error = %e, "hashing password");
            ApiError::Internal
        })
    }
}

fn require_self_or_admin(session: &SessionInfo, user_id: i32) -> Result<(), ApiError> {
    if session.user_is_admin || session.user_id == user_id {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_TAG,
    operation_id = "Register User",
    summary = "Create a user account",
    description = "The response carries the new account's TOTP secret and provisioning URI. \
                   The account can log in once the secret is verified.",
    request_body = UserRegistrationInput,
    responses(
        (status = 201, description = "User created", body = UserCreationResponse),
        (status = 400, description = "Invalid input or username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub(super) async fn register(
    State(service): State<Arc<Service>>,
    input: Option<Extension<UserRegistrationInput>>,
) -> Result<(StatusCode, Json<UserCreationResponse>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let two_factor_secret = random_string();
    let created = service
        .user_data_manager
        .create_user(NewUser {
            username: input.username.clone(),
            hashed_password: service.hash_password(&input.password)?,
            two_factor_secret: two_factor_secret.clone(),
        })
        .await
        .map_err(|e| match e {
            DataError::Conflict => ApiError::BadRequest("username already taken".to_string()),
            other => other.into(),
        })?;
    tracing::info!(user_id = created.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserCreationResponse {
            id: created.id,
            account_status: created.status(),
            two_factor_uri: totp::provisioning_uri(&created.username, &two_factor_secret),
            username: created.username,
            two_factor_secret,
            created_on: created.created_on,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/users/totp_secret/verify",
    tag = USERS_TAG,
    operation_id = "Verify TOTP Secret",
    summary = "Prove possession of the two factor secret",
    request_body = TotpSecretVerificationInput,
    responses(
        (status = 202, description = "Secret verified"),
        (status = 400, description = "Invalid token or already verified", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub(super) async fn verify_totp_secret(
    State(service): State<Arc<Service>>,
    input: Option<Extension<TotpSecretVerificationInput>>,
) -> Result<StatusCode, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let user = service.user_data_manager.get_user(input.user_id).await?;
    if user.two_factor_verified() {
        return Err(ApiError::BadRequest(
            "two factor secret already verified".to_string(),
        ));
    }
    if !totp::verify_code(&user.two_factor_secret, &input.totp_token) {
        tracing::debug!(user_id = user.id, "invalid TOTP token");
        return Err(ApiError::BadRequest("invalid TOTP token".to_string()));
    }

    service
        .user_data_manager
        .mark_two_factor_secret_verified(user.id)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    path = "/totp_secret/new",
    tag = USERS_TAG,
    operation_id = "New TOTP Secret",
    summary = "Replace the two factor secret",
    description = "The new secret must be verified again before the next login.",
    request_body = TotpSecretRefreshInput,
    responses(
        (status = 202, description = "New secret issued", body = TotpSecretRefreshResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn new_totp_secret(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<TotpSecretRefreshInput>>,
) -> Result<(StatusCode, Json<TotpSecretRefreshResponse>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let user = service
        .reauthenticate(session.user_id, &input.current_password, &input.totp_token)
        .await?;

    let two_factor_secret = random_string();
    service
        .user_data_manager
        .update_two_factor_secret(user.id, &two_factor_secret)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TotpSecretRefreshResponse {
            two_factor_uri: totp::provisioning_uri(&user.username, &two_factor_secret),
            two_factor_secret,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/password/new",
    tag = USERS_TAG,
    operation_id = "Update Password",
    request_body = PasswordUpdateInput,
    responses(
        (status = 202, description = "Password changed"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn update_password(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<PasswordUpdateInput>>,
) -> Result<StatusCode, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };
    validation::min_length(
        "new_password",
        &input.new_password,
        service.auth.minimum_password_length,
    )?;

    let user = service
        .reauthenticate(session.user_id, &input.current_password, &input.totp_token)
        .await?;
    let hashed = service.hash_password(&input.new_password)?;
    service
        .user_data_manager
        .update_user_password(user.id, &hashed)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    get,
    path = "/",
    tag = USERS_TAG,
    operation_id = "List Users",
    summary = "List users (admin only)",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of users", body = UserList),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub(super) async fn list_users(
    State(service): State<Arc<Service>>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<UserList>, ApiError> {
    let page = service.user_data_manager.get_users(&filter).await?;
    Ok(Json(UserList {
        pagination: page.pagination(),
        users: page.items.into_iter().map(User::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = USERS_TAG,
    operation_id = "Search Users",
    summary = "Case-insensitive username search (admin only)",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 401, description = "Not an admin", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn search_users(
    State(service): State<Arc<Service>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    validation::required("q", &query.q)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let users = service
        .user_data_manager
        .search_users_by_username(&query.q, limit)
        .await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

#[utoipa::path(
    get,
    path = "/self",
    tag = USERS_TAG,
    operation_id = "Current User",
    responses(
        (status = 200, description = "The requesting user", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn self_user(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
) -> Result<Json<User>, ApiError> {
    let user = service.user_data_manager.get_user(session.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = USERS_TAG,
    operation_id = "Read User",
    summary = "Read a user (admin, or the user themself)",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 401, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service, session))]
pub(super) async fn read_user(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<User>, ApiError> {
    require_self_or_admin(&session, id)?;
    let user = service.user_data_manager.get_user(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USERS_TAG,
    operation_id = "Archive User",
    summary = "Archive a user (admin, or the user themself)",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "User archived"),
        (status = 401, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service, session))]
pub(super) async fn archive_user(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    require_self_or_admin(&session, id)?;
    service
        .user_data_manager
        .archive_user(id, session.user_id)
        .await?;
    tracing::info!(user_id = id, performed_by = session.user_id, "user archived");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = USERS_TAG,
    operation_id = "User Audit Log",
    summary = "Audit log entries for one user (admin only)",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn user_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .user_data_manager
        .get_audit_log_entries_for_user(id)
        .await?;
    Ok(audit_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_types::users::AccountStatus;

    fn session(user_id: i32, admin: bool) -> SessionInfo {
        SessionInfo {
            user_id,
            user_is_admin: admin,
            account_status: AccountStatus::Good,
        }
    }

    #[test]
    fn users_may_act_on_themselves() {
        assert!(require_self_or_admin(&session(3, false), 3).is_ok());
        assert!(require_self_or_admin(&session(3, false), 4).is_err());
        assert!(require_self_or_admin(&session(3, true), 4).is_ok());
    }
}
