use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::audit::AuditLogEntry;
use todo_types::plans::{Plan, PlanCreationInput, PlanList, PlanUpdateInput};
use todo_types::{ErrorResponse, QueryFilter};

use super::{PLANS_TAG, Service};
use crate::api::input::scoped_filter;
use crate::context::SessionInfo;
use crate::error::ApiError;
use crate::services::audit_entries;

#[utoipa::path(
    get,
    path = "/",
    tag = PLANS_TAG,
    operation_id = "List Plans",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of plans", body = PlanList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all)]
pub(super) async fn list_plans(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<PlanList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = service.plan_data_manager.get_plans(&filter).await?;

    Ok(Json(PlanList {
        pagination: page.pagination(),
        plans: page.items.into_iter().map(Plan::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = PLANS_TAG,
    operation_id = "Create Plan",
    summary = "Create a plan (admin only)",
    request_body = PlanCreationInput,
    responses(
        (status = 201, description = "Plan created", body = Plan),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_plan(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<PlanCreationInput>>,
) -> Result<(StatusCode, Json<Plan>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let plan = service
        .plan_data_manager
        .create_plan(&input, session.user_id)
        .await?;
    tracing::info!(plan_id = plan.id, name = %plan.name, "plan created");
    Ok((StatusCode::CREATED, Json(plan.into())))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PLANS_TAG,
    operation_id = "Read Plan",
    params(("id" = i32, Path, description = "Plan id")),
    responses(
        (status = 200, description = "The plan", body = Plan),
        (status = 404, description = "No such plan", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn read_plan(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Plan>, ApiError> {
    let plan = service.plan_data_manager.get_plan(id).await?;
    Ok(Json(plan.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = PLANS_TAG,
    operation_id = "Update Plan",
    summary = "Update a plan (admin only)",
    params(("id" = i32, Path, description = "Plan id")),
    request_body = PlanUpdateInput,
    responses(
        (status = 200, description = "The updated plan", body = Plan),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "No such plan", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service, session, input), fields(user_id = session.user_id))]
pub(super) async fn update_plan(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
    input: Option<Extension<PlanUpdateInput>>,
) -> Result<Json<Plan>, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let mut plan = service.plan_data_manager.get_plan(id).await?;
    let changes = plan.update(&input);
    if changes.is_empty() {
        return Ok(Json(plan.into()));
    }

    let plan = service
        .plan_data_manager
        .update_plan(&plan, changes, session.user_id)
        .await?;
    Ok(Json(plan.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PLANS_TAG,
    operation_id = "Archive Plan",
    summary = "Archive a plan (admin only)",
    params(("id" = i32, Path, description = "Plan id")),
    responses(
        (status = 204, description = "Plan archived"),
        (status = 401, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "No such plan", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_plan(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .plan_data_manager
        .archive_plan(id, session.user_id)
        .await?;
    tracing::info!(plan_id = id, "plan archived");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = PLANS_TAG,
    operation_id = "Plan Audit Log",
    summary = "Audit log entries for one plan (admin only)",
    params(("id" = i32, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn plan_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .plan_data_manager
        .get_audit_log_entries_for_plan(id)
        .await?;
    Ok(audit_entries(entries))
}
