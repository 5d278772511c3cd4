//! HTTP client for the to-do server.
//!
//! Every server route is mirrored by a pair of methods: `build_<op>_request`
//! produces the [`reqwest::Request`] without sending it, and `<op>` sends it
//! and decodes the response. Non-success statuses are mapped onto
//! [`ClientError`].
//!
//! ```no_run
//! # async fn run() -> Result<(), todo_client::ClientError> {
//! let mut client = todo_client::Client::new("http://localhost:8080")?;
//! client.fetch_token("client-id", "client-secret", &["items"]).await?;
//! let items = client.list_items(&Default::default()).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Method, RequestBuilder, Response, StatusCode, header, redirect};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use todo_types::{ErrorResponse, QueryFilter};
use todo_types::oauth2::OAuth2ErrorResponse;
use url::Url;

mod accounts;
mod admin;
mod api_clients;
mod auth;
mod items;
mod meta;
mod oauth2;
mod plans;
mod users;
mod webhooks;

pub use auth::LoginResponse;
pub use oauth2::AuthorizeParams;

const USER_AGENT: &str = concat!("todo-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("resource not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid request input: {0}")]
    InvalidRequestInput(String),
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Client for one server. Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
    session_cookie: Option<String>,
}

impl Client {
    /// Redirects are not followed so the implicit grant's `Location` can be
    /// read back.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        Self::with_http_client(http, base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            bearer_token: None,
            session_cookie: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// `cookie` is the `name=value` pair returned by [`Client::login`].
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub(crate) fn set_bearer_token(&mut self, token: String) {
        self.bearer_token = Some(token);
    }

    /// Joins `path` onto the base URL, keeping any prefix the base carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url, ClientError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// A request builder with the client's credentials attached.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let mut builder = self.http.request(method, self.url(path)?);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        Ok(builder)
    }

    #[tracing::instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub(crate) async fn execute(&self, request: reqwest::Request) -> Result<Response, ClientError> {
        let response = self.http.execute(request).await?;
        tracing::debug!(status = %response.status(), "response received");
        check_status(response).await
    }

    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, ClientError> {
        Ok(self.execute(request).await?.json().await?)
    }

    pub(crate) async fn execute_empty(&self, request: reqwest::Request) -> Result<(), ClientError> {
        self.execute(request).await.map(|_| ())
    }

    // Request shapes shared by every resource collection.

    pub(crate) fn list_request(
        &self,
        collection: &str,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::GET, collection)?.query(filter).build()?)
    }

    pub(crate) fn create_request<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        input: &T,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::POST, collection)?.json(input).build()?)
    }

    pub(crate) fn read_request(
        &self,
        collection: &str,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, &format!("{collection}/{id}"))?
            .build()?)
    }

    pub(crate) fn update_request<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        id: i32,
        input: &T,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::PUT, &format!("{collection}/{id}"))?
            .json(input)
            .build()?)
    }

    pub(crate) fn archive_request(
        &self,
        collection: &str,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::DELETE, &format!("{collection}/{id}"))?
            .build()?)
    }

    pub(crate) fn audit_request(
        &self,
        collection: &str,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, &format!("{collection}/{id}/audit"))?
            .build()?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }

    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden,
        StatusCode::BAD_REQUEST => ClientError::InvalidRequestInput(error_message(response).await),
        other => ClientError::UnexpectedStatus(other.as_u16()),
    })
}

/// Pulls a readable message out of either error body the server produces.
async fn error_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if let Ok(error) = serde_json::from_str::<ErrorResponse>(&body) {
        return error.message;
    }
    if let Ok(error) = serde_json::from_str::<OAuth2ErrorResponse>(&body) {
        return error.error_description.unwrap_or(error.error);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_keeps_base_path_prefix() {
        let client = Client::new("http://localhost:8080/todo").unwrap();
        assert_eq!(
            client.url("/api/v1/items").unwrap().as_str(),
            "http://localhost:8080/todo/api/v1/items"
        );

        let client = Client::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.url("/api/v1/items/3").unwrap().as_str(),
            "http://localhost:8080/api/v1/items/3"
        );
    }

    #[test]
    fn credentials_are_attached() {
        let client = Client::new("http://localhost:8080")
            .unwrap()
            .with_bearer_token("abc")
            .with_session_cookie("todocookie=xyz");
        let request = client
            .request(Method::GET, "/api/v1/items")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(request.headers()[header::COOKIE], "todocookie=xyz");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            Client::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
