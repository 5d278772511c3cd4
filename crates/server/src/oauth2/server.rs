//! The OAuth2 protocol engine: token issuance, bearer validation and the
//! authorize endpoint.
//!
//! Policy decisions (is this client allowed this grant, this scope, on
//! behalf of which user) are delegated to [`ServerCallbacks`], which the
//! owning service supplies at construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};
use todo_types::oauth2::TokenResponse;
use url::Url;
use utoipa::{IntoParams, ToSchema};

use super::error::{AuthorizationFailure, OAuth2Error};
use super::store::{ClientInfo, ClientStore, TokenInfo, TokenStore};
use crate::random::random_token;

pub const BEARER: &str = "Bearer";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    #[serde(rename = "password")]
    PasswordCredentials,
    ClientCredentials,
    #[serde(rename = "refresh_token")]
    Refreshing,
    Implicit,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::PasswordCredentials => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::Refreshing => "refresh_token",
            GrantType::Implicit => "implicit",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "password" => Ok(GrantType::PasswordCredentials),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            "refresh_token" => Ok(GrantType::Refreshing),
            "implicit" => Ok(GrantType::Implicit),
            _ => Err(OAuth2Error::UnsupportedGrantType),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Space-separated scopes; every one must be granted to the client
    pub scope: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeRequest {
    /// `token` for the implicit flow
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

/// Abstraction over the protocol engine so handlers can be tested against a
/// double.
#[async_trait]
pub trait OAuth2Handler: Send + Sync {
    /// Resolves the bearer token carried by a request.
    async fn validation_bearer_token(&self, parts: &Parts) -> Result<TokenInfo, OAuth2Error>;
    /// Returns the URL the user agent should be redirected to.
    async fn handle_authorize_request(
        &self,
        parts: &Parts,
        request: AuthorizeRequest,
    ) -> Result<Url, OAuth2Error>;
    async fn handle_token_request(
        &self,
        headers: &HeaderMap,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error>;
}

/// Authorization decisions supplied by the service that owns the engine.
#[async_trait]
pub trait ServerCallbacks: Send + Sync {
    async fn client_authorized(
        &self,
        client_id: &str,
        grant: GrantType,
    ) -> Result<(), AuthorizationFailure>;
    async fn client_scope(&self, client_id: &str, scope: &str)
    -> Result<(), AuthorizationFailure>;
    /// The scope a request is asking for, if the requester may have it.
    /// `requested` is the scope named in the authorize request, if any.
    async fn authorize_scope(
        &self,
        parts: &Parts,
        requested: Option<&str>,
    ) -> Result<String, AuthorizationFailure>;
    /// The string id of the user a request acts on behalf of.
    async fn user_authorization(&self, parts: &Parts) -> Result<String, AuthorizationFailure>;
    /// Converts an unexpected failure into the error returned to the caller.
    fn internal_error(&self, err: &OAuth2Error) -> OAuth2Error;
    /// Observes every error response the engine produces.
    fn response_error(&self, err: &OAuth2Error);
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub access_token_lifetime: Duration,
    pub allowed_grant_types: Vec<GrantType>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::hours(1),
            allowed_grant_types: vec![GrantType::ClientCredentials],
        }
    }
}

#[derive(Clone)]
pub struct OAuth2Server {
    config: ServerConfig,
    clients: Arc<dyn ClientStore>,
    tokens: Arc<dyn TokenStore>,
    callbacks: Arc<dyn ServerCallbacks>,
}

impl OAuth2Server {
    pub fn new(
        config: ServerConfig,
        clients: Arc<dyn ClientStore>,
        tokens: Arc<dyn TokenStore>,
        callbacks: Arc<dyn ServerCallbacks>,
    ) -> Self {
        Self {
            config,
            clients,
            tokens,
            callbacks,
        }
    }

    fn check_grant_allowed(&self, grant: GrantType) -> bool {
        self.config.allowed_grant_types.contains(&grant)
    }

    fn report(&self, err: OAuth2Error) -> OAuth2Error {
        let err = match err {
            OAuth2Error::ServerError(_) => self.callbacks.internal_error(&err),
            other => other,
        };
        self.callbacks.response_error(&err);
        err
    }

    async fn issue_token(&self, client: &ClientInfo, scope: String) -> Result<TokenInfo, OAuth2Error> {
        let now = OffsetDateTime::now_utc();
        let token = TokenInfo {
            access_token: random_token(),
            client_id: client.id.clone(),
            user_id: client.user_id.clone(),
            scope,
            created_on: now,
            expires_at: now + self.config.access_token_lifetime,
        };
        self.tokens.create(&token).await?;
        Ok(token)
    }

    async fn token_request(
        &self,
        headers: &HeaderMap,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let (client_id, client_secret) = extract_client_credentials(headers, &request);
        let client_id = client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| OAuth2Error::InvalidRequest("client_id is required".to_string()))?;

        let grant: GrantType = request.grant_type.parse()?;
        if !self.check_grant_allowed(grant) || grant != GrantType::ClientCredentials {
            return Err(OAuth2Error::UnsupportedGrantType);
        }

        let client = self.clients.get_by_id(&client_id).await?;
        let provided = client_secret.unwrap_or_default();
        if !bool::from(client.secret.as_bytes().ct_eq(provided.as_bytes())) {
            return Err(OAuth2Error::InvalidClient);
        }

        self.callbacks
            .client_authorized(&client_id, grant)
            .await
            .map_err(AuthorizationFailure::into_oauth2_error)?;

        let scope = request.scope.unwrap_or_default().trim().to_string();
        if !scope.is_empty() {
            self.callbacks
                .client_scope(&client_id, &scope)
                .await
                .map_err(AuthorizationFailure::into_oauth2_error)?;
        }

        let token = self.issue_token(&client, scope).await?;
        Ok(TokenResponse {
            token_type: BEARER.to_string(),
            expires_in: token.expires_in(),
            access_token: token.access_token,
            scope: token.scope,
        })
    }

    async fn authorize_request(
        &self,
        parts: &Parts,
        request: AuthorizeRequest,
    ) -> Result<Url, OAuth2Error> {
        let grant = match request.response_type.as_str() {
            "token" => GrantType::Implicit,
            "code" => GrantType::AuthorizationCode,
            other => {
                return Err(OAuth2Error::UnsupportedResponseType(format!(
                    "unknown response type {other}"
                )));
            }
        };
        if !self.check_grant_allowed(grant) {
            return Err(OAuth2Error::UnauthorizedClient(format!(
                "{grant} grants are not enabled"
            )));
        }

        let client = self.clients.get_by_id(&request.client_id).await?;
        if client.domain.is_empty() {
            return Err(OAuth2Error::InvalidRequest(
                "no redirect_uri registered".to_string(),
            ));
        }
        let registered = Url::parse(&client.domain)
            .map_err(|e| OAuth2Error::InvalidRequest(format!("invalid registered URI: {e}")))?;
        let mut redirect = match request.redirect_uri.as_deref() {
            Some(uri) => {
                let requested = Url::parse(uri).map_err(|e| {
                    OAuth2Error::InvalidRequest(format!("invalid redirect_uri: {e}"))
                })?;
                if !redirect_matches(&registered, &requested) {
                    return Err(OAuth2Error::InvalidRequest(
                        "redirect_uri does not match the registered URI".to_string(),
                    ));
                }
                requested
            }
            None => registered,
        };

        self.callbacks
            .user_authorization(parts)
            .await
            .map_err(AuthorizationFailure::into_oauth2_error)?;
        let scope = self
            .callbacks
            .authorize_scope(parts, request.scope.as_deref())
            .await
            .map_err(AuthorizationFailure::into_oauth2_error)?;
        self.callbacks
            .client_authorized(&client.id, grant)
            .await
            .map_err(AuthorizationFailure::into_oauth2_error)?;

        if grant == GrantType::AuthorizationCode {
            return Err(OAuth2Error::UnsupportedResponseType(
                "authorization codes are not issued".to_string(),
            ));
        }

        let token = self.issue_token(&client, scope).await?;
        let mut fragment = url::form_urlencoded::Serializer::new(String::new());
        fragment
            .append_pair("access_token", &token.access_token)
            .append_pair("token_type", BEARER)
            .append_pair("expires_in", &token.expires_in().to_string())
            .append_pair("scope", &token.scope);
        if let Some(state) = &request.state {
            fragment.append_pair("state", state);
        }
        redirect.set_fragment(Some(&fragment.finish()));
        Ok(redirect)
    }
}

#[async_trait]
impl OAuth2Handler for OAuth2Server {
    async fn validation_bearer_token(&self, parts: &Parts) -> Result<TokenInfo, OAuth2Error> {
        let access_token = bearer_token(parts).ok_or(OAuth2Error::InvalidAccessToken)?;

        let token = self
            .tokens
            .get_by_access(&access_token)
            .await?
            .ok_or(OAuth2Error::InvalidAccessToken)?;
        if token.is_expired() {
            return Err(OAuth2Error::ExpiredAccessToken);
        }
        Ok(token)
    }

    async fn handle_authorize_request(
        &self,
        parts: &Parts,
        request: AuthorizeRequest,
    ) -> Result<Url, OAuth2Error> {
        self.authorize_request(parts, request)
            .await
            .map_err(|e| self.report(e))
    }

    async fn handle_token_request(
        &self,
        headers: &HeaderMap,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        self.token_request(headers, request)
            .await
            .map_err(|e| self.report(e))
    }
}

/// Same origin as the registered URI, and a path at or below its path.
fn redirect_matches(registered: &Url, requested: &Url) -> bool {
    if registered.scheme() != requested.scheme()
        || registered.host_str() != requested.host_str()
        || registered.port_or_known_default() != requested.port_or_known_default()
    {
        return false;
    }

    let base = registered.path().trim_end_matches('/');
    match requested.path().strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// `Authorization: Bearer` header first, then the `access_token` query
/// parameter.
fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(token) = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    url::form_urlencoded::parse(parts.uri.query()?.as_bytes())
        .find(|(k, _)| k == "access_token")
        .map(|(_, v)| v.into_owned())
}

/// HTTP Basic credentials first, then the form body.
fn extract_client_credentials(
    headers: &HeaderMap,
    request: &TokenRequest,
) -> (Option<String>, Option<String>) {
    if let Some(auth) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        && let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(auth)
        && let Ok(creds) = String::from_utf8(decoded)
        && let Some((id, secret)) = creds.split_once(':')
    {
        return (Some(id.to_string()), Some(secret.to_string()));
    }

    (request.client_id.clone(), request.client_secret.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::Mutex;

    struct FixedClients(ClientInfo);

    #[async_trait]
    impl ClientStore for FixedClients {
        async fn get_by_id(&self, client_id: &str) -> Result<ClientInfo, OAuth2Error> {
            if client_id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(OAuth2Error::InvalidClient)
            }
        }
    }

    #[derive(Default)]
    struct MemoryTokens(Mutex<Vec<TokenInfo>>);

    #[async_trait]
    impl TokenStore for MemoryTokens {
        async fn create(&self, token: &TokenInfo) -> Result<(), OAuth2Error> {
            self.0.lock().unwrap().push(token.clone());
            Ok(())
        }

        async fn get_by_access(
            &self,
            access_token: &str,
        ) -> Result<Option<TokenInfo>, OAuth2Error> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.access_token == access_token)
                .cloned())
        }
    }

    /// Approves everything except scopes other than `items`.
    #[derive(Default)]
    struct PermissiveCallbacks {
        errors: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ServerCallbacks for PermissiveCallbacks {
        async fn client_authorized(
            &self,
            _client_id: &str,
            grant: GrantType,
        ) -> Result<(), AuthorizationFailure> {
            if grant == GrantType::PasswordCredentials {
                return Err(AuthorizationFailure::GrantNotAllowed(grant));
            }
            Ok(())
        }

        async fn client_scope(
            &self,
            _client_id: &str,
            scope: &str,
        ) -> Result<(), AuthorizationFailure> {
            if scope == "items" {
                Ok(())
            } else {
                Err(AuthorizationFailure::ScopeDenied)
            }
        }

        async fn authorize_scope(
            &self,
            _parts: &Parts,
            requested: Option<&str>,
        ) -> Result<String, AuthorizationFailure> {
            Ok(requested.unwrap_or("items").to_string())
        }

        async fn user_authorization(&self, _parts: &Parts) -> Result<String, AuthorizationFailure> {
            Ok("7".to_string())
        }

        fn internal_error(&self, _err: &OAuth2Error) -> OAuth2Error {
            OAuth2Error::ServerError("Internal error".to_string())
        }

        fn response_error(&self, err: &OAuth2Error) {
            self.errors.lock().unwrap().push(err.code().to_string());
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            id: "client".into(),
            secret: "s3cret".into(),
            domain: "https://app.example.com/callback".into(),
            user_id: "7".into(),
        }
    }

    fn server_with(config: ServerConfig) -> (OAuth2Server, Arc<PermissiveCallbacks>) {
        let callbacks = Arc::new(PermissiveCallbacks::default());
        let server = OAuth2Server::new(
            config,
            Arc::new(FixedClients(client())),
            Arc::new(MemoryTokens::default()),
            callbacks.clone(),
        );
        (server, callbacks)
    }

    fn parts(uri: &str, bearer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn form(grant: &str, secret: &str, scope: Option<&str>) -> TokenRequest {
        TokenRequest {
            grant_type: grant.into(),
            client_id: Some("client".into()),
            client_secret: Some(secret.into()),
            scope: scope.map(String::from),
        }
    }

    #[tokio::test]
    async fn client_credentials_token_round_trips_through_bearer_validation() {
        let (server, _) = server_with(ServerConfig::default());
        let issued = server
            .handle_token_request(
                &HeaderMap::new(),
                form("client_credentials", "s3cret", Some("items")),
            )
            .await
            .unwrap();

        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(issued.scope, "items");

        let token = server
            .validation_bearer_token(&parts("/api/v1/items", Some(&issued.access_token)))
            .await
            .unwrap();
        assert_eq!(token.client_id, "client");
        assert_eq!(token.user_id, "7");

        let via_query = server
            .validation_bearer_token(&parts(
                &format!("/api/v1/items?access_token={}", issued.access_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(via_query.access_token, issued.access_token);
    }

    #[tokio::test]
    async fn basic_auth_credentials_are_accepted() {
        let (server, _) = server_with(ServerConfig::default());
        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode("client:s3cret");
        headers.insert("authorization", format!("Basic {encoded}").parse().unwrap());

        let request = TokenRequest {
            grant_type: "client_credentials".into(),
            ..Default::default()
        };
        assert!(server.handle_token_request(&headers, request).await.is_ok());
    }

    #[tokio::test]
    async fn token_request_rejections() {
        let (server, callbacks) = server_with(ServerConfig::default());

        let wrong_secret = server
            .handle_token_request(&HeaderMap::new(), form("client_credentials", "nope", None))
            .await;
        assert!(matches!(wrong_secret, Err(OAuth2Error::InvalidClient)));

        let password = server
            .handle_token_request(&HeaderMap::new(), form("password", "s3cret", None))
            .await;
        assert!(matches!(password, Err(OAuth2Error::UnsupportedGrantType)));

        let bad_scope = server
            .handle_token_request(
                &HeaderMap::new(),
                form("client_credentials", "s3cret", Some("users")),
            )
            .await;
        assert!(matches!(bad_scope, Err(OAuth2Error::InvalidScope)));

        assert_eq!(
            *callbacks.errors.lock().unwrap(),
            ["invalid_client", "unsupported_grant_type", "invalid_scope"]
        );
    }

    #[tokio::test]
    async fn unknown_bearer_token_is_rejected() {
        let (server, _) = server_with(ServerConfig::default());
        let missing = server
            .validation_bearer_token(&parts("/api/v1/items", None))
            .await;
        assert!(matches!(missing, Err(OAuth2Error::InvalidAccessToken)));

        let unknown = server
            .validation_bearer_token(&parts("/api/v1/items", Some("forged")))
            .await;
        assert!(matches!(unknown, Err(OAuth2Error::InvalidAccessToken)));
    }

    #[tokio::test]
    async fn expired_bearer_token_is_rejected() {
        let (server, _) = server_with(ServerConfig {
            access_token_lifetime: Duration::seconds(-1),
            ..Default::default()
        });
        let issued = server
            .handle_token_request(&HeaderMap::new(), form("client_credentials", "s3cret", None))
            .await
            .unwrap();

        let result = server
            .validation_bearer_token(&parts("/api/v1/items", Some(&issued.access_token)))
            .await;
        assert!(matches!(result, Err(OAuth2Error::ExpiredAccessToken)));
    }

    #[tokio::test]
    async fn implicit_grant_requires_configuration() {
        let request = AuthorizeRequest {
            response_type: "token".into(),
            client_id: "client".into(),
            redirect_uri: None,
            scope: None,
            state: Some("xyz".into()),
        };

        let (server, _) = server_with(ServerConfig::default());
        let disabled = server
            .handle_authorize_request(&parts("/oauth2/authorize", None), request.clone())
            .await;
        assert!(matches!(disabled, Err(OAuth2Error::UnauthorizedClient(_))));

        let (server, _) = server_with(ServerConfig {
            allowed_grant_types: vec![GrantType::ClientCredentials, GrantType::Implicit],
            ..Default::default()
        });
        let redirect = server
            .handle_authorize_request(&parts("/oauth2/authorize", None), request)
            .await
            .unwrap();
        assert_eq!(redirect.path(), "/callback");
        let fragment = redirect.fragment().unwrap();
        assert!(fragment.contains("token_type=Bearer"));
        assert!(fragment.contains("scope=items"));
        assert!(fragment.contains("state=xyz"));
    }

    #[tokio::test]
    async fn authorize_rejects_foreign_redirects() {
        let (server, _) = server_with(ServerConfig {
            allowed_grant_types: vec![GrantType::Implicit],
            ..Default::default()
        });
        let result = server
            .handle_authorize_request(
                &parts("/oauth2/authorize", None),
                AuthorizeRequest {
                    response_type: "token".into(),
                    client_id: "client".into(),
                    redirect_uri: Some("https://evil.example.com/".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(OAuth2Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn authorize_rejects_lookalike_redirects() {
        let (server, _) = server_with(ServerConfig {
            allowed_grant_types: vec![GrantType::Implicit],
            ..Default::default()
        });
        for uri in [
            "https://app.example.com.evil.io/callback",
            "https://app.example.com/callbackevil",
            "http://app.example.com/callback",
            "https://app.example.com:8443/callback",
            "https://app.example.com/other",
        ] {
            let result = server
                .handle_authorize_request(
                    &parts("/oauth2/authorize", None),
                    AuthorizeRequest {
                        response_type: "token".into(),
                        client_id: "client".into(),
                        redirect_uri: Some(uri.into()),
                        ..Default::default()
                    },
                )
                .await;
            assert!(
                matches!(result, Err(OAuth2Error::InvalidRequest(_))),
                "{uri} was accepted"
            );
        }

        let redirect = server
            .handle_authorize_request(
                &parts("/oauth2/authorize", None),
                AuthorizeRequest {
                    response_type: "token".into(),
                    client_id: "client".into(),
                    redirect_uri: Some("https://app.example.com/callback/done?x=1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(redirect.host_str(), Some("app.example.com"));
        assert_eq!(redirect.path(), "/callback/done");
    }

    #[test]
    fn redirect_paths_match_on_segment_boundaries() {
        let registered = Url::parse("https://app.example.com/").unwrap();
        for ok in [
            "https://app.example.com",
            "https://app.example.com/a/b",
            "https://app.example.com:443/",
        ] {
            assert!(redirect_matches(&registered, &Url::parse(ok).unwrap()), "{ok}");
        }
        assert!(!redirect_matches(
            &registered,
            &Url::parse("https://app.example.com.evil.io/").unwrap()
        ));
    }

    #[test]
    fn grant_types_parse_from_wire_names() {
        assert_eq!(
            "client_credentials".parse::<GrantType>().unwrap(),
            GrantType::ClientCredentials
        );
        assert_eq!(GrantType::PasswordCredentials.to_string(), "password");
        assert!("magic".parse::<GrantType>().is_err());
    }
}
