use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::Service;
use crate::context::{AttachedClient, AttachedClientId};
use crate::error::ApiError;

/// Rejects requests without a bearer token that grants the path's scope and
/// attaches the client otherwise.
#[tracing::instrument(skip_all)]
pub async fn oauth2_token_authentication_middleware(
    State(service): State<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    match service.extract_oauth2_client_from_request(&parts).await {
        Ok(client) => {
            tracing::debug!(client_id = %client.client_id, "attaching oauth2 client");
            parts.extensions.insert(AttachedClient(client));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => {
            tracing::info!(error = %e, "rejecting request without valid oauth2 token");
            ApiError::unauthorized().into_response()
        }
    }
}

impl Service {
    /// Looks up `client_id` for the authorize callbacks. Unknown clients are
    /// unauthorized.
    pub(super) async fn resolve_client_id(
        &self,
        client_id: &str,
    ) -> Result<AttachedClientId, ApiError> {
        match self
            .client_data_manager
            .get_oauth2_client_by_client_id(client_id)
            .await
        {
            Ok(client) => Ok(AttachedClientId(client.client_id)),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::error!(client_id, error = %e, "fetching oauth2 client");
                }
                Err(ApiError::unauthorized())
            }
        }
    }
}

/// Resolves a `client_id` query parameter to a known client. Requests
/// without one pass through untouched.
#[tracing::instrument(skip_all)]
pub async fn oauth2_client_info_middleware(
    State(service): State<Arc<Service>>,
    mut req: Request,
    next: Next,
) -> Response {
    let client_id = req.uri().query().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "client_id")
            .map(|(_, v)| v.into_owned())
    });

    if let Some(client_id) = client_id.filter(|id| !id.is_empty()) {
        match service.resolve_client_id(&client_id).await {
            Ok(attached) => {
                req.extensions_mut().insert(attached);
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
