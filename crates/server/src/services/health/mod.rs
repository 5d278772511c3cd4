//! Liveness and readiness probes under `/_meta_`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::database::{DataError, Querier};

/// Tag for OpenAPI documentation.
pub const META_TAG: &str = "Meta";

/// Something the service can't serve requests without.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DataError>;
}

#[async_trait]
impl ReadinessCheck for Querier {
    async fn ping(&self) -> Result<(), DataError> {
        Querier::ping(self).await
    }
}

pub struct Service {
    database: Arc<dyn ReadinessCheck>,
}

impl Service {
    pub fn new(database: Arc<dyn ReadinessCheck>) -> Self {
        Self { database }
    }

    pub fn router(self: &Arc<Self>) -> OpenApiRouter {
        OpenApiRouter::new()
            .routes(routes!(live))
            .routes(routes!(ready))
            .with_state(self.clone())
    }
}

#[utoipa::path(
    method(get, head),
    path = "/_meta_/live",
    tag = META_TAG,
    operation_id = "Liveness",
    summary = "The process is up",
    responses(
        (status = 200, description = "Alive", body = str, content_type = "text/plain", example = "ok")
    )
)]
async fn live() -> &'static str {
    "ok"
}

#[utoipa::path(
    method(get, head),
    path = "/_meta_/ready",
    tag = META_TAG,
    operation_id = "Readiness",
    summary = "The database answers queries",
    responses(
        (status = 200, description = "Ready", body = str, content_type = "text/plain", example = "ok"),
        (status = 503, description = "Database unreachable", body = str, content_type = "text/plain")
    )
)]
#[tracing::instrument(skip_all)]
async fn ready(State(service): State<Arc<Service>>) -> (StatusCode, &'static str) {
    match service.database.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use sea_orm::DbErr;

    struct Database {
        up: bool,
    }

    #[async_trait]
    impl ReadinessCheck for Database {
        async fn ping(&self) -> Result<(), DataError> {
            if self.up {
                Ok(())
            } else {
                Err(DataError::Database(DbErr::Custom("connection refused".into())))
            }
        }
    }

    fn server(up: bool) -> TestServer {
        let service = Arc::new(Service::new(Arc::new(Database { up })));
        let (router, _) = service.router().split_for_parts();
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn live_always_answers() {
        let response = server(false).get("/_meta_/live").await;
        response.assert_status_ok();
        response.assert_text("ok");
    }

    #[tokio::test]
    async fn ready_reflects_database() {
        server(true).get("/_meta_/ready").await.assert_status_ok();
        server(false)
            .get("/_meta_/ready")
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
