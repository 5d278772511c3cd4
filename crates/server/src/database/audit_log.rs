//! Audit trail writes and reads.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde_json::{Value, json};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;
use todo_types::audit::FieldChangeSummary;

use super::{AuditLogEntryDataManager, DataError, ListPage, Querier, fetch_page};
use crate::entity::audit_log_entry;

pub const USER_RESOURCE: &str = "user";
pub const OAUTH2_CLIENT_RESOURCE: &str = "oauth2_client";
pub const API_CLIENT_RESOURCE: &str = "api_client";
pub const ITEM_RESOURCE: &str = "item";
pub const WEBHOOK_RESOURCE: &str = "webhook";
pub const ACCOUNT_RESOURCE: &str = "account";
pub const PLAN_RESOURCE: &str = "plan";

/// One row to append to the audit log.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub event_type: String,
    pub resource_type: &'static str,
    pub resource_id: Option<i32>,
    pub context: Value,
}

impl AuditEvent {
    /// `<resource>_<action>` event performed by `performed_by`.
    pub fn new(resource_type: &'static str, action: &str, resource_id: i32, performed_by: i32) -> Self {
        Self {
            event_type: format!("{resource_type}_{action}"),
            resource_type,
            resource_id: Some(resource_id),
            context: json!({ "performed_by": performed_by }),
        }
    }

    pub fn with_changes(mut self, changes: &[FieldChangeSummary]) -> Self {
        self.context["changes"] = json!(changes);
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context[key] = value.into();
        self
    }
}

/// Appends `event` using `conn`, which is usually the caller's transaction.
pub async fn record<C: ConnectionTrait>(conn: &C, event: AuditEvent) -> Result<(), DbErr> {
    let context = serde_json::to_string(&event.context)
        .map_err(|e| DbErr::Custom(format!("encoding audit context: {e}")))?;

    audit_log_entry::ActiveModel {
        event_type: Set(event.event_type),
        resource_type: Set(event.resource_type.to_string()),
        resource_id: Set(event.resource_id),
        context: Set(context),
        created_on: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Every entry recorded against one resource, oldest first.
pub async fn entries_for<C: ConnectionTrait>(
    conn: &C,
    resource_type: &str,
    resource_id: i32,
) -> Result<Vec<audit_log_entry::Model>, DataError> {
    let entries = audit_log_entry::Entity::find()
        .filter(audit_log_entry::Column::ResourceType.eq(resource_type))
        .filter(audit_log_entry::Column::ResourceId.eq(resource_id))
        .order_by_asc(audit_log_entry::Column::Id)
        .all(conn)
        .await?;

    if entries.is_empty() {
        return Err(DataError::NotFound);
    }
    Ok(entries)
}

#[async_trait]
impl AuditLogEntryDataManager for Querier {
    async fn get_audit_log_entry(&self, id: i32) -> Result<audit_log_entry::Model, DataError> {
        audit_log_entry::Entity::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_audit_log_entries(
        &self,
        filter: &ListFilter,
    ) -> Result<ListPage<audit_log_entry::Model>, DataError> {
        Ok(fetch_page(
            self.connection(),
            audit_log_entry::Entity::find(),
            audit_log_entry::Column::Id,
            filter,
        )
        .await?)
    }
}
