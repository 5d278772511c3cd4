use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use todo_types::audit::AuditLogEntry;
use todo_types::oauth2::{OAuth2ErrorResponse, TokenResponse};
use todo_types::oauth2_clients::{OAuth2Client, OAuth2ClientCreationInput, OAuth2ClientList};
use todo_types::{ErrorResponse, QueryFilter};
use url::Url;

use super::{ClientExtractionError, OAUTH2_CLIENTS_TAG, OAUTH2_TAG, Service};
use crate::api::input::scoped_filter;
use crate::authentication::AuthenticationError;
use crate::context::{AttachedClientId, RequestHead, SessionInfo, request_path};
use crate::database::NewOAuth2Client;
use crate::entity::oauth2_client;
use crate::error::ApiError;
use crate::oauth2::{AuthorizeRequest, OAuth2Error, TokenRequest};
use crate::random::random_string;
use crate::services::audit_entries;

const API_PREFIX: &str = "/api/v1/";

/// The scope a request needs: the resource collection under `/api/v1`
/// (`/api/v1/items/5/audit` needs `items`), otherwise the last path segment.
pub fn determine_scope(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if let Some(resource) = path
        .strip_prefix(API_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .filter(|s| !s.is_empty())
    {
        return resource.to_string();
    }
    path.rsplit('/').next().unwrap_or_default().to_string()
}

impl Service {
    /// Validates the request's bearer token and returns its client, provided
    /// the client holds the scope of the requested path.
    #[tracing::instrument(skip_all, fields(path = %request_path(parts)))]
    pub async fn extract_oauth2_client_from_request(
        &self,
        parts: &Parts,
    ) -> Result<oauth2_client::Model, ClientExtractionError> {
        let token = self.oauth2_handler.validation_bearer_token(parts).await?;

        let client = self
            .client_data_manager
            .get_oauth2_client_by_client_id(&token.client_id)
            .await
            .inspect_err(|e| {
                tracing::error!(client_id = %token.client_id, error = %e, "error fetching OAuth2 client");
            })?;

        let scope = determine_scope(request_path(parts));
        if !client.has_scope(&scope) {
            tracing::info!(
                client_id = %client.client_id,
                scope,
                scopes = %client.scopes,
                "rejecting client for invalid scope"
            );
            return Err(ClientExtractionError::ScopeDenied(scope));
        }

        Ok(client)
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = OAUTH2_CLIENTS_TAG,
    operation_id = "List OAuth2 Clients",
    summary = "List the requesting user's OAuth2 clients",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of clients", body = OAuth2ClientList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn list_oauth2_clients(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<OAuth2ClientList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = match service
        .client_data_manager
        .get_oauth2_clients(session.user_id, &filter)
        .await
    {
        Ok(page) => page,
        // no rows is just an empty page
        Err(e) if e.is_not_found() => crate::database::ListPage {
            items: Vec::new(),
            page: filter.page(),
            limit: filter.limit(),
            total_count: 0,
        },
        Err(e) => return Err(e.into()),
    };

    Ok(Json(OAuth2ClientList {
        pagination: page.pagination(),
        clients: page.items.into_iter().map(OAuth2Client::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = OAUTH2_CLIENTS_TAG,
    operation_id = "Create OAuth2 Client",
    summary = "Register a new OAuth2 client",
    description = "Re-authenticates the requesting user with their password and TOTP code, \
                   then generates a client id and secret. The secret is only returned here.",
    request_body = OAuth2ClientCreationInput,
    responses(
        (status = 201, description = "Client created", body = OAuth2Client),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_oauth2_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<OAuth2ClientCreationInput>>,
) -> Result<(StatusCode, Json<OAuth2Client>), ApiError> {
    let Some(Extension(input)) = input else {
        tracing::info!("valid input not attached to request");
        return Err(ApiError::invalid_input());
    };

    let user = service
        .user_data_manager
        .get_user_by_username(&input.username)
        .await
        .map_err(|e| {
            tracing::error!(username = %input.username, error = %e, "fetching user by username");
            ApiError::Internal
        })?;
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

    let client_secret = random_string();
    let created = service
        .client_data_manager
        .create_oauth2_client(NewOAuth2Client {
            name: input.name,
            client_id: random_string(),
            client_secret: client_secret.clone(),
            redirect_uri: input.redirect_uri,
            scopes: input.scopes,
            implicit_allowed: input.implicit_allowed,
            belongs_to_user: session.user_id,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "creating oauth2 client");
            ApiError::Internal
        })?;

    tracing::info!(oauth2_client_id = created.id, "oauth2 client created");
    let mut client = OAuth2Client::from(created);
    client.client_secret = client_secret;
    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = OAUTH2_CLIENTS_TAG,
    operation_id = "Read OAuth2 Client",
    params(("id" = i32, Path, description = "Database id of the client")),
    responses(
        (status = 200, description = "The client", body = OAuth2Client),
        (status = 404, description = "No such client", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn read_oauth2_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<OAuth2Client>, ApiError> {
    let client = service
        .client_data_manager
        .get_oauth2_client(id, session.user_id)
        .await?;
    Ok(Json(client.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = OAUTH2_CLIENTS_TAG,
    operation_id = "Archive OAuth2 Client",
    params(("id" = i32, Path, description = "Database id of the client")),
    responses(
        (status = 204, description = "Client archived"),
        (status = 404, description = "No such client", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_oauth2_client(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .client_data_manager
        .archive_oauth2_client(id, session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = OAUTH2_CLIENTS_TAG,
    operation_id = "OAuth2 Client Audit Log",
    summary = "Audit log entries for one client (admin only)",
    params(("id" = i32, Path, description = "Database id of the client")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn oauth2_client_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .client_data_manager
        .get_audit_log_entries_for_oauth2_client(id)
        .await?;
    tracing::debug!(entry_count = entries.len(), "returning audit entries");
    Ok(audit_entries(entries))
}

fn redirect_or_error(result: Result<Url, OAuth2Error>) -> Response {
    match result {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/authorize",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Authorize",
    summary = "Authorization endpoint",
    description = "Only the implicit flow (`response_type=token`) issues tokens, and only when \
                   enabled in configuration and on the client.",
    params(AuthorizeRequest),
    responses(
        (status = 302, description = "Redirect to the client with the token in the fragment"),
        (status = 400, description = "Malformed request", body = OAuth2ErrorResponse),
        (status = 401, description = "Client or user not authorized", body = OAuth2ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(client_id = %request.client_id))]
pub(super) async fn authorize(
    State(service): State<Arc<Service>>,
    RequestHead(parts): RequestHead,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    redirect_or_error(
        service
            .oauth2_handler
            .handle_authorize_request(&parts, request)
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/authorize",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Authorize (form)",
    request_body(content = AuthorizeRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to the client with the token in the fragment"),
        (status = 400, description = "Malformed request", body = OAuth2ErrorResponse),
        (status = 401, description = "Client or user not authorized", body = OAuth2ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(client_id = %request.client_id))]
pub(super) async fn authorize_form(
    State(service): State<Arc<Service>>,
    RequestHead(mut parts): RequestHead,
    Form(request): Form<AuthorizeRequest>,
) -> Response {
    // The info middleware only sees the query string.
    if parts.extensions.get::<AttachedClientId>().is_none() && !request.client_id.is_empty() {
        match service.resolve_client_id(&request.client_id).await {
            Ok(attached) => {
                parts.extensions.insert(attached);
            }
            Err(e) => return e.into_response(),
        }
    }

    redirect_or_error(
        service
            .oauth2_handler
            .handle_authorize_request(&parts, request)
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/token",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Token",
    summary = "Token endpoint",
    description = "Exchanges client credentials (HTTP Basic or form fields) for a bearer token. \
                   Only the `client_credentials` grant is accepted.",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed request or unsupported grant", body = OAuth2ErrorResponse),
        (status = 401, description = "Unknown client or bad secret", body = OAuth2ErrorResponse),
        (status = 500, description = "Internal server error", body = OAuth2ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(grant_type = %request.grant_type))]
pub(super) async fn token(
    State(service): State<Arc<Service>>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, OAuth2Error> {
    let token = service
        .oauth2_handler
        .handle_token_request(&headers, request)
        .await?;
    Ok(Json(token))
}
