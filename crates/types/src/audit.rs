use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;

/// A single field modified by an update, recorded in the audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldChangeSummary {
    pub field_name: String,
    #[schema(value_type = Object)]
    pub old_value: Value,
    #[schema(value_type = Object)]
    pub new_value: Value,
}

impl FieldChangeSummary {
    pub fn new(field_name: &str, old_value: impl Into<Value>, new_value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.to_string(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: i32,
    /// e.g. `item_created`, `oauth2_client_archived`
    pub event_type: String,
    pub resource_type: String,
    pub resource_id: Option<i32>,
    /// Free-form event context: who performed it and what changed
    #[schema(value_type = Object)]
    pub context: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntryList {
    pub entries: Vec<AuditLogEntry>,
    #[serde(flatten)]
    pub pagination: Pagination,
}
