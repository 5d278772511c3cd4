//! Request-body decoding middleware.
//!
//! A decoded, validated input is stored in the request extensions; handlers
//! pick it up with `Option<Extension<T>>` and answer 400 when it is absent.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::request::Parts,
    middleware::{Next, from_fn},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use todo_types::{QueryFilter, Validate, ValidationError};
use utoipa_axum::router::UtoipaMethodRouter;

use crate::context::SessionInfo;
use crate::error::ApiError;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Reads and parses a JSON body, handing back the request head.
pub async fn read_json<T: DeserializeOwned>(req: Request) -> Result<(Parts, T), ApiError> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::invalid_input())?;
    let input = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "undecodable request body");
        ApiError::invalid_input()
    })?;
    Ok((parts, input))
}

/// Decodes the body into `T`, runs `check`, and attaches the result.
pub async fn attach_input<T, F>(req: Request, next: Next, check: F) -> Response
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    F: FnOnce(&T) -> Result<(), ValidationError>,
{
    let (mut parts, input) = match read_json::<T>(req).await {
        Ok(decoded) => decoded,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check(&input) {
        tracing::debug!(error = %e, "rejecting invalid input");
        return ApiError::from(e).into_response();
    }

    parts.extensions.insert(input);
    next.run(Request::from_parts(parts, Body::empty())).await
}

/// Middleware for any input that validates itself.
pub async fn decode_input<T>(req: Request, next: Next) -> Response
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
{
    attach_input::<T, _>(req, next, T::validate).await
}

/// Puts [`decode_input`] in front of a single route.
pub fn with_input<T, S>(route: UtoipaMethodRouter<S>) -> UtoipaMethodRouter<S>
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    let (schemas, paths, method_router) = route;
    (
        schemas,
        paths,
        method_router.route_layer(from_fn(decode_input::<T>)),
    )
}

/// Only admins may list archived rows.
pub fn scoped_filter(mut filter: QueryFilter, session: &SessionInfo) -> QueryFilter {
    if !session.user_is_admin {
        filter.include_archived = None;
    }
    filter
}
