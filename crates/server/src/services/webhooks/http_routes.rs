use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::audit::AuditLogEntry;
use todo_types::webhooks::{Webhook, WebhookCreationInput, WebhookList, WebhookUpdateInput};
use todo_types::{ErrorResponse, QueryFilter};

use super::{Service, WEBHOOKS_TAG};
use crate::api::input::scoped_filter;
use crate::context::SessionInfo;
use crate::error::ApiError;
use crate::services::audit_entries;

#[utoipa::path(
    get,
    path = "/",
    tag = WEBHOOKS_TAG,
    operation_id = "List Webhooks",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of webhooks", body = WebhookList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn list_webhooks(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<WebhookList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = service
        .webhook_data_manager
        .get_webhooks(session.user_id, &filter)
        .await?;

    Ok(Json(WebhookList {
        pagination: page.pagination(),
        webhooks: page.items.into_iter().map(Webhook::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = WEBHOOKS_TAG,
    operation_id = "Create Webhook",
    request_body = WebhookCreationInput,
    responses(
        (status = 201, description = "Webhook created", body = Webhook),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_webhook(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<WebhookCreationInput>>,
) -> Result<(StatusCode, Json<Webhook>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let webhook = service
        .webhook_data_manager
        .create_webhook(&input, session.user_id)
        .await?;
    tracing::info!(webhook_id = webhook.id, url = %webhook.url, "webhook created");
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = WEBHOOKS_TAG,
    operation_id = "Read Webhook",
    params(("id" = i32, Path, description = "Webhook id")),
    responses(
        (status = 200, description = "The webhook", body = Webhook),
        (status = 404, description = "No such webhook", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn read_webhook(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<Webhook>, ApiError> {
    let webhook = service
        .webhook_data_manager
        .get_webhook(id, session.user_id)
        .await?;
    Ok(Json(webhook.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = WEBHOOKS_TAG,
    operation_id = "Update Webhook",
    params(("id" = i32, Path, description = "Webhook id")),
    request_body = WebhookUpdateInput,
    responses(
        (status = 200, description = "The updated webhook", body = Webhook),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "No such webhook", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session, input), fields(user_id = session.user_id))]
pub(super) async fn update_webhook(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
    input: Option<Extension<WebhookUpdateInput>>,
) -> Result<Json<Webhook>, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let mut webhook = service
        .webhook_data_manager
        .get_webhook(id, session.user_id)
        .await?;
    let changes = webhook.update(&input);
    if changes.is_empty() {
        return Ok(Json(webhook.into()));
    }

    let webhook = service
        .webhook_data_manager
        .update_webhook(&webhook, changes)
        .await?;
    Ok(Json(webhook.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = WEBHOOKS_TAG,
    operation_id = "Archive Webhook",
    params(("id" = i32, Path, description = "Webhook id")),
    responses(
        (status = 204, description = "Webhook archived"),
        (status = 404, description = "No such webhook", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_webhook(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .webhook_data_manager
        .archive_webhook(id, session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = WEBHOOKS_TAG,
    operation_id = "Webhook Audit Log",
    summary = "Audit log entries for one webhook (admin only)",
    params(("id" = i32, Path, description = "Webhook id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn webhook_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .webhook_data_manager
        .get_audit_log_entries_for_webhook(id)
        .await?;
    Ok(audit_entries(entries))
}
