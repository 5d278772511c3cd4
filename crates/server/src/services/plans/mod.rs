//! Subscription plans. Every user may browse them; only admins change them.

use std::sync::Arc;

use todo_types::plans::{PlanCreationInput, PlanUpdateInput};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::database::PlanDataManager;
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const PLANS_TAG: &str = "Plans";

pub struct Service {
    plan_data_manager: Arc<dyn PlanDataManager>,
}

impl Service {
    pub fn new(plan_data_manager: Arc<dyn PlanDataManager>) -> Self {
        Self { plan_data_manager }
    }

    /// Nested at `/api/v1/plans`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_plans))
            .routes(admin_only(with_input::<PlanCreationInput, _>(routes!(
                http_routes::create_plan
            ))))
            .routes(routes!(http_routes::read_plan))
            .routes(admin_only(with_input::<PlanUpdateInput, _>(routes!(
                http_routes::update_plan
            ))))
            .routes(admin_only(routes!(http_routes::archive_plan)))
            .routes(admin_only(routes!(http_routes::plan_audit)))
            .with_state(self.clone())
    }
}
