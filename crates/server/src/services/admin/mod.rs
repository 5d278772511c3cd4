//! Admin-only routes: the full audit log and account standing.

use std::sync::Arc;

use axum::middleware::from_fn;
use todo_types::users::UserReputationUpdateInput;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::database::{AuditLogEntryDataManager, UserDataManager};
use crate::services::auth::admin_middleware;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const ADMIN_TAG: &str = "Admin";

pub struct Service {
    user_data_manager: Arc<dyn UserDataManager>,
    audit_log_data_manager: Arc<dyn AuditLogEntryDataManager>,
}

impl Service {
    pub fn new(
        user_data_manager: Arc<dyn UserDataManager>,
        audit_log_data_manager: Arc<dyn AuditLogEntryDataManager>,
    ) -> Self {
        Self {
            user_data_manager,
            audit_log_data_manager,
        }
    }

    /// Nested at `/api/v1/admin`; every route requires an admin.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_audit_log_entries))
            .routes(routes!(http_routes::read_audit_log_entry))
            .routes(with_input::<UserReputationUpdateInput, _>(routes!(
                http_routes::update_user_status
            )))
            .layer(from_fn(admin_middleware))
            .with_state(self.clone())
    }
}
