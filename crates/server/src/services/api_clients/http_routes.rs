use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::api_clients::{
    ApiClient, ApiClientCreationInput, ApiClientCreationResponse, ApiClientList,
};
use todo_types::audit::AuditLogEntry;
use todo_types::{ErrorResponse, QueryFilter};

use super::{API_CLIENTS_TAG, Service};
use crate::api::input::scoped_filter;
use crate::authentication::AuthenticationError;
use crate::context::SessionInfo;
use crate::database::NewApiClient;
use crate::error::ApiError;
use crate::random::{random_string, random_token};
use crate::services::audit_entries;

#[utoipa::path(
    get,
    path = "/",
    tag = API_CLIENTS_TAG,
    operation_id = "List API Clients",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of API clients", body = ApiClientList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn list_api_clients(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<ApiClientList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = service
        .api_client_data_manager
        .get_api_clients(session.user_id, &filter)
        .await?;

    Ok(Json(ApiClientList {
        pagination: page.pagination(),
        clients: page.items.into_iter().map(ApiClient::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = API_CLIENTS_TAG,
    operation_id = "Create API Client",
    summary = "Issue a new API client",
    description = "Re-authenticates the requesting user with their password and TOTP code. \
                   The secret key is only returned here.",
    request_body = ApiClientCreationInput,
    responses(
        (status = 201, description = "Client created", body = ApiClientCreationResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_api_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<ApiClientCreationInput>>,
) -> Result<(StatusCode, Json<ApiClientCreationResponse>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let user = match service
        .user_data_manager
        .get_user_by_username(&input.username)
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_not_found() => return Err(ApiError::unauthorized()),
        Err(e) => return Err(e.into()),
    };
    if user.id != session.user_id {
        tracing::debug!(username = %input.username, "credentials belong to another user");
        return Err(ApiError::unauthorized());
    }

    match service.authenticator.validate_login(
        &user.hashed_password,
        &input.password,
        &user.two_factor_secret,
        &input.totp_token,
    ) {
        Ok(true) => {}
        Ok(false) | Err(AuthenticationError::InvalidTwoFactorCode) => {
            tracing::debug!("invalid credentials provided");
            return Err(ApiError::unauthorized());
        }
        Err(e) => {
            tracing::error!(error = %e, "validating user credentials");
            return Err(ApiError::Internal);
        }
    }

    let secret_key = random_token();
    let created = service
        .api_client_data_manager
        .create_api_client(NewApiClient {
            name: input.name,
            client_id: random_string(),
            secret_key: secret_key.clone(),
            belongs_to_user: session.user_id,
        })
        .await?;
    tracing::info!(api_client_id = created.id, "api client created");

    Ok((
        StatusCode::CREATED,
        Json(ApiClientCreationResponse {
            id: created.id,
            client_id: created.client_id,
            client_secret: secret_key,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = API_CLIENTS_TAG,
    operation_id = "Read API Client",
    params(("id" = i32, Path, description = "API client id")),
    responses(
        (status = 200, description = "The client", body = ApiClient),
        (status = 404, description = "No such client", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn read_api_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<ApiClient>, ApiError> {
    let client = service
        .api_client_data_manager
        .get_api_client(id, session.user_id)
        .await?;
    Ok(Json(client.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = API_CLIENTS_TAG,
    operation_id = "Archive API Client",
    params(("id" = i32, Path, description = "API client id")),
    responses(
        (status = 204, description = "Client archived"),
        (status = 404, description = "No such client", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_api_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .api_client_data_manager
        .archive_api_client(id, session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = API_CLIENTS_TAG,
    operation_id = "API Client Audit Log",
    summary = "Audit log entries for one API client (admin only)",
    params(("id" = i32, Path, description = "API client id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn api_client_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .api_client_data_manager
        .get_audit_log_entries_for_api_client(id)
        .await?;
    Ok(audit_entries(entries))
}
