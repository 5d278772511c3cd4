//! HTTP services, one module per resource.
//!
//! Every service owns the data managers it needs and builds an
//! [`OpenApiRouter`](utoipa_axum::router::OpenApiRouter) that
//! [`crate::api::build_router`] nests under its prefix.

use axum::Json;
use todo_types::audit::AuditLogEntry;

use crate::entity::audit_log_entry;

pub mod accounts;
pub mod admin;
pub mod api_clients;
pub mod auth;
pub mod health;
pub mod items;
pub mod oauth2clients;
pub mod plans;
pub mod users;
pub mod webhooks;

/// Body of every `/{id}/audit` route.
pub(crate) fn audit_entries(entries: Vec<audit_log_entry::Model>) -> Json<Vec<AuditLogEntry>> {
    Json(entries.into_iter().map(AuditLogEntry::from).collect())
}
