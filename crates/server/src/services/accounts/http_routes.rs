use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::accounts::{Account, AccountCreationInput, AccountList, AccountUpdateInput};
use todo_types::audit::AuditLogEntry;
use todo_types::{ErrorResponse, QueryFilter};

use super::{ACCOUNTS_TAG, Service};
use crate::api::input::scoped_filter;
use crate::context::SessionInfo;
use crate::error::ApiError;
use crate::services::audit_entries;

#[utoipa::path(
    get,
    path = "/",
    tag = ACCOUNTS_TAG,
    operation_id = "List Accounts",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of accounts", body = AccountList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn list_accounts(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<AccountList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = service
        .account_data_manager
        .get_accounts(session.user_id, &filter)
        .await?;

    Ok(Json(AccountList {
        pagination: page.pagination(),
        accounts: page.items.into_iter().map(Account::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = ACCOUNTS_TAG,
    operation_id = "Create Account",
    request_body = AccountCreationInput,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid input or unknown plan", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_account(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<AccountCreationInput>>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };
    service.check_plan(input.plan_id).await?;

    let account = service
        .account_data_manager
        .create_account(&input, session.user_id)
        .await?;
    tracing::info!(account_id = account.id, "account created");
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = ACCOUNTS_TAG,
    operation_id = "Read Account",
    params(("id" = i32, Path, description = "Account id")),
    responses(
        (status = 200, description = "The account", body = Account),
        (status = 404, description = "No such account", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn read_account(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<Account>, ApiError> {
    let account = service
        .account_data_manager
        .get_account(id, session.user_id)
        .await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = ACCOUNTS_TAG,
    operation_id = "Update Account",
    params(("id" = i32, Path, description = "Account id")),
    request_body = AccountUpdateInput,
    responses(
        (status = 200, description = "The updated account", body = Account),
        (status = 400, description = "Invalid input or unknown plan", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session, input), fields(user_id = session.user_id))]
pub(super) async fn update_account(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
    input: Option<Extension<AccountUpdateInput>>,
) -> Result<Json<Account>, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let mut account = service
        .account_data_manager
        .get_account(id, session.user_id)
        .await?;
    service.check_plan(input.plan_id).await?;

    let changes = account.update(&input);
    if changes.is_empty() {
        return Ok(Json(account.into()));
    }

    let account = service
        .account_data_manager
        .update_account(&account, changes)
        .await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = ACCOUNTS_TAG,
    operation_id = "Archive Account",
    params(("id" = i32, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account archived"),
        (status = 404, description = "No such account", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_account(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .account_data_manager
        .archive_account(id, session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = ACCOUNTS_TAG,
    operation_id = "Account Audit Log",
    summary = "Audit log entries for one account (admin only)",
    params(("id" = i32, Path, description = "Account id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn account_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .account_data_manager
        .get_audit_log_entries_for_account(id)
        .await?;
    Ok(audit_entries(entries))
}
