use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use todo_types::audit::AuditLogEntry;
use todo_types::items::{Item, ItemCreationInput, ItemList, ItemUpdateInput, SearchQuery};
use todo_types::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use todo_types::{ErrorResponse, QueryFilter, validation};

use super::{ITEMS_TAG, Service};
use crate::api::input::scoped_filter;
use crate::context::SessionInfo;
use crate::error::ApiError;
use crate::services::audit_entries;

#[utoipa::path(
    get,
    path = "/",
    tag = ITEMS_TAG,
    operation_id = "List Items",
    params(QueryFilter),
    responses(
        (status = 200, description = "One page of items", body = ItemList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn list_items(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(filter): Query<QueryFilter>,
) -> Result<Json<ItemList>, ApiError> {
    let filter = scoped_filter(filter, &session);
    let page = service
        .item_data_manager
        .get_items(session.user_id, &filter)
        .await?;

    Ok(Json(ItemList {
        pagination: page.pagination(),
        items: page.items.into_iter().map(Item::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = ITEMS_TAG,
    operation_id = "Create Item",
    request_body = ItemCreationInput,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = session.user_id))]
pub(super) async fn create_item(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    input: Option<Extension<ItemCreationInput>>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let item = service
        .item_data_manager
        .create_item(&input, session.user_id)
        .await?;
    tracing::debug!(item_id = item.id, "item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = ITEMS_TAG,
    operation_id = "Search Items",
    summary = "Case-insensitive search over the requesting user's item names",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching items", body = Vec<Item>),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn search_items(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, ApiError> {
    validation::required("q", &query.q)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let items = service
        .item_data_manager
        .search_items(session.user_id, &query.q, limit)
        .await?;
    Ok(Json(items.into_iter().map(Item::from).collect()))
}

#[utoipa::path(
    head,
    path = "/{id}",
    tag = ITEMS_TAG,
    operation_id = "Item Exists",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "The item exists"),
        (status = 404, description = "No such item")
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn item_exists(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if service
        .item_data_manager
        .item_exists(id, session.user_id)
        .await?
    {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound)
    }
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = ITEMS_TAG,
    operation_id = "Read Item",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "The item", body = Item),
        (status = 404, description = "No such item", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn read_item(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<Json<Item>, ApiError> {
    let item = service
        .item_data_manager
        .get_item(id, session.user_id)
        .await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = ITEMS_TAG,
    operation_id = "Update Item",
    summary = "Change an item's name or details",
    params(("id" = i32, Path, description = "Item id")),
    request_body = ItemUpdateInput,
    responses(
        (status = 200, description = "The updated item", body = Item),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "No such item", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session, input), fields(user_id = session.user_id))]
pub(super) async fn update_item(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
    input: Option<Extension<ItemUpdateInput>>,
) -> Result<Json<Item>, ApiError> {
    let Some(Extension(input)) = input else {
        return Err(ApiError::invalid_input());
    };

    let mut item = service
        .item_data_manager
        .get_item(id, session.user_id)
        .await?;
    let changes = item.update(&input);
    if changes.is_empty() {
        return Ok(Json(item.into()));
    }

    let item = service.item_data_manager.update_item(&item, changes).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = ITEMS_TAG,
    operation_id = "Archive Item",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item archived"),
        (status = 404, description = "No such item", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("cookie" = []), ("oauth2" = []))
)]
#[tracing::instrument(skip(service, session), fields(user_id = session.user_id))]
pub(super) async fn archive_item(
    State(service): State<Arc<Service>>,
    Extension(session): Extension<SessionInfo>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service
        .item_data_manager
        .archive_item(id, session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/audit",
    tag = ITEMS_TAG,
    operation_id = "Item Audit Log",
    summary = "Audit log entries for one item (admin only)",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Entries, oldest first", body = Vec<AuditLogEntry>),
        (status = 404, description = "No entries", body = ErrorResponse)
    ),
    security(("cookie" = []))
)]
#[tracing::instrument(skip(service))]
pub(super) async fn item_audit(
    State(service): State<Arc<Service>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = service
        .item_data_manager
        .get_audit_log_entries_for_item(id)
        .await?;
    Ok(audit_entries(entries))
}
