//! To-do items, owned by the user who created them.

use std::sync::Arc;

use todo_types::items::{ItemCreationInput, ItemUpdateInput};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::input::with_input;
use crate::database::ItemDataManager;
use crate::services::auth::admin_only;

mod http_routes;

/// Tag for OpenAPI documentation.
pub const ITEMS_TAG: &str = "Items";

pub struct Service {
    item_data_manager: Arc<dyn ItemDataManager>,
}

impl Service {
    pub fn new(item_data_manager: Arc<dyn ItemDataManager>) -> Self {
        Self { item_data_manager }
    }

    /// Nested at `/api/v1/items`.
    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(http_routes::list_items))
            .routes(with_input::<ItemCreationInput, _>(routes!(
                http_routes::create_item
            )))
            .routes(routes!(http_routes::search_items))
            .routes(routes!(
                http_routes::read_item,
                http_routes::item_exists,
                http_routes::archive_item
            ))
            .routes(with_input::<ItemUpdateInput, _>(routes!(
                http_routes::update_item
            )))
            .routes(admin_only(routes!(http_routes::item_audit)))
            .with_state(self.clone())
    }
}
