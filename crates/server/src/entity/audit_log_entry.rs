//! Audit log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::audit::AuditLogEntry;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_type: String,
    pub resource_type: String,
    pub resource_id: Option<i32>,
    /// JSON document
    pub context: String,
    pub created_on: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AuditLogEntry {
    fn from(entry: Model) -> Self {
        let context = serde_json::from_str(&entry.context).unwrap_or(serde_json::Value::Null);
        Self {
            id: entry.id,
            event_type: entry.event_type,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            context,
            created_on: entry.created_on,
        }
    }
}
