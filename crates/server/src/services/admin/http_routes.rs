use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::audit::{AuditLogEntry, AuditLogEntryList};
use todo_types::users::UserReputationUpdateInput;
use todo_types::{ErrorResponse, QueryFilter};

use super::{ADMIN_TAG, Service};
use crate::context::SessionInfo;
use crate::error::ApiError;

#[utoipa::path(
    get,
    path = "/audit_log",
    tag = ADMIN_TAG,
    operation_id = "List Audit Log Entries",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of audit log entries", body = AuditLogEntryList),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all)]
pub(super) async fn list_audit_log_entries(
    State(service): State<Arc<Service>>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<AuditLogEntryList>, ApiError> {
    let page = service
        .audit_log_data_manager
        .get_audit_log_entries(&filter)
        .await?;

    Ok(Json(AuditLogEntryList {
        pagination: page.pagination(),
        entries: page.items.into_iter().map(AuditLogEntry::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/audit_log/{id}",
    tag = ADMIN_TAG,
    operation_id = "Read Audit Log Entry",
    params(("id" = i32, Path, description = "Audit log entry id")),
    responses(
        (status = 200, description = "The entry", body = AuditLogEntry),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "No such entry", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn read_audit_log_entry(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<AuditLogEntry>, ApiError> {
    let entry = service.audit_log_data_manager.get_audit_log_entry(id).await?;
    Ok(Json(entry.into()))
}

#[utoipa::path(
    post,
    path = "/users/status",
    tag = ADMIN_TAG,
    operation_id = "Update User Status",
    summary = "Change a user's account standing",
    description = "Banning or terminating a user locks them out of every route. Admins cannot \
                   change their own standing.",
    request_body = UserReputationUpdateInput,
    responses(
        (status = 202, description = "Status changed"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn update_user_status(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<UserReputationUpdateInput>>,
) -> Result<StatusCode, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };
    if input.target_user_id == session.user_id {
        return Err(ApiError::BadRequest(
            "cannot change your own account status".to_string(),
        ));
    }

    service
        .user_data_manager
        .update_user_reputation(
            input.target_user_id,
            input.new_status,
            &input.reason,
            session.user_id,
        )
        .await?;
    tracing::info!(
        target_user_id = input.target_user_id,
        new_status = %input.new_status,
        "user status changed"
    );
    Ok(StatusCode::ACCEPTED)
}
