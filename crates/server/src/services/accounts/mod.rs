//! Billing accounts. Each account belongs to one user and may be on a plan.

use std::sync::Arc;

use todo_types::accounts::{AccountCreationInput, AccountUpdateInput};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::database::{AccountDataManager, DataError, PlanDataManager};
use crate::error::ApiError;
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const ACCOUNTS_TAG: &str = "Accounts";

pub struct Service {
    account_data_manager: Arc<dyn AccountDataManager>,
    plan_data_manager: Arc<dyn PlanDataManager>,
}

impl Service {
    pub fn new(
        account_data_manager: Arc<dyn AccountDataManager>,
        plan_data_manager: Arc<dyn PlanDataManager>,
    ) -> Self {
        Self {
            account_data_manager,
            plan_data_manager,
        }
    }

    /// Nested at `/api/v1/accounts`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_accounts))
            .routes(with_input::<AccountCreationInput, _>(routes!(
                http_routes::create_account
            )))
            .routes(routes!(
                http_routes::read_account,
                http_routes::archive_account
            ))
            .routes(with_input::<AccountUpdateInput, _>(routes!(
                http_routes::update_account
            )))
            .routes(admin_only(routes!(http_routes::account_audit)))
            .with_state(self.clone())
    }

    /// 400 when `plan_id` names a plan that doesn't exist or was archived.
    async fn check_plan(&self, plan_id: Option<i32>) -> Result<(), ApiError> {
        let Some(plan_id) = plan_id else {
            return Ok(());
        };
        match self.plan_data_manager.get_plan(plan_id).await {
            Ok(_) => Ok(()),
            Err(DataError::NotFound) => {
                tracing::debug!(plan_id, "account refers to unknown plan");
                Err(ApiError::BadRequest(format!("plan {plan_id} does not exist")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
