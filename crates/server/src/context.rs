//! Typed values the middleware attaches to a request's extensions.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::{Request, request::Parts};
use todo_types::users::AccountStatus;

use crate::entity::{oauth2_client, user};

/// The authenticated human behind a request, from a session cookie or from
/// the owner of a bearer token's client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: i32,
    pub user_is_admin: bool,
    pub account_status: AccountStatus,
}

impl SessionInfo {
    pub fn is_banned(&self) -> bool {
        self.account_status.is_locked_out()
    }
}

impl From<&user::Model> for SessionInfo {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            user_is_admin: user.is_admin,
            account_status: user.status(),
        }
    }
}

/// OAuth2 client resolved from a validated bearer token.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachedClient(pub oauth2_client::Model);

/// Public `client_id` named by an authorize request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachedClientId(pub String);

/// A copy of the request head, for handlers that hand it to the OAuth2
/// engine alongside a body extractor.
pub struct RequestHead(pub Parts);

impl<S> FromRequestParts<S> for RequestHead
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut head = Request::new(()).into_parts().0;
        head.method = parts.method.clone();
        head.uri = parts.uri.clone();
        head.version = parts.version;
        head.headers = parts.headers.clone();
        head.extensions = parts.extensions.clone();
        Ok(Self(head))
    }
}

/// The path as the client sent it, before any router nesting stripped it.
pub fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| parts.uri.path())
}
