//! Outbound webhook registrations.
//!
//! Only the registrations are managed here; nothing dispatches events to
//! them yet.

use std::sync::Arc;

use todo_types::webhooks::{WebhookCreationInput, WebhookUpdateInput};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::database::WebhookDataManager;
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const WEBHOOKS_TAG: &str = "Webhooks";

pub struct Service {
    webhook_data_manager: Arc<dyn WebhookDataManager>,
}

impl Service {
    pub fn new(webhook_data_manager: Arc<dyn WebhookDataManager>) -> Self {
        Self {
            webhook_data_manager,
        }
    }

    /// Nested at `/api/v1/webhooks`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_webhooks))
            .routes(with_input::<WebhookCreationInput, _>(routes!(
                http_routes::create_webhook
            )))
            .routes(routes!(
                http_routes::read_webhook,
                http_routes::archive_webhook
            ))
            .routes(with_input::<WebhookUpdateInput, _>(routes!(
                http_routes::update_webhook
            )))
            .routes(admin_only(routes!(http_routes::webhook_audit)))
            .with_state(self.clone())
    }
}
