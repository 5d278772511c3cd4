//! Authorization callbacks the OAuth2 engine consults.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

use super::http_routes::determine_scope;
use crate::context::{AttachedClient, AttachedClientId, SessionInfo, request_path};
use crate::database::OAuth2ClientDataManager;
use crate::entity::oauth2_client;
use crate::oauth2::{AuthorizationFailure, GrantType, OAuth2Error, ServerCallbacks};

pub struct ClientAuthorizer {
    client_data_manager: Arc<dyn OAuth2ClientDataManager>,
}

impl ClientAuthorizer {
    pub fn new(client_data_manager: Arc<dyn OAuth2ClientDataManager>) -> Self {
        Self {
            client_data_manager,
        }
    }

    async fn fetch_client(
        &self,
        client_id: &str,
    ) -> Result<oauth2_client::Model, AuthorizationFailure> {
        self.client_data_manager
            .get_oauth2_client_by_client_id(client_id)
            .await
            .map_err(|e| {
                if !e.is_not_found() {
                    tracing::error!(client_id, error = %e, "fetching oauth2 client");
                }
                AuthorizationFailure::from_lookup(e)
            })
    }
}

/// The scope named by the request (decoded body or query string) wins over
/// the one implied by the path.
fn requested_scope(parts: &Parts, requested: Option<&str>) -> String {
    requested
        .map(str::to_string)
        .or_else(|| {
            url::form_urlencoded::parse(parts.uri.query()?.as_bytes())
                .find(|(k, _)| k == "scope")
                .map(|(_, v)| v.into_owned())
        })
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| determine_scope(request_path(parts)))
}

fn grants(client: &oauth2_client::Model, scope: &str) -> bool {
    !scope.trim().is_empty() && client.has_all_scopes(scope)
}

#[async_trait]
impl ServerCallbacks for ClientAuthorizer {
    #[tracing::instrument(skip(self))]
    async fn client_authorized(
        &self,
        client_id: &str,
        grant: GrantType,
    ) -> Result<(), AuthorizationFailure> {
        if grant == GrantType::PasswordCredentials {
            return Err(AuthorizationFailure::GrantNotAllowed(grant));
        }

        let client = self.fetch_client(client_id).await?;
        if grant == GrantType::Implicit && !client.implicit_allowed {
            return Err(AuthorizationFailure::ImplicitNotAllowed);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn client_scope(
        &self,
        client_id: &str,
        scope: &str,
    ) -> Result<(), AuthorizationFailure> {
        let client = self.fetch_client(client_id).await?;
        if !grants(&client, scope) {
            tracing::info!(client_id, scope, "client denied scope");
            return Err(AuthorizationFailure::ScopeDenied);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(path = %parts.uri.path()))]
    async fn authorize_scope(
        &self,
        parts: &Parts,
        requested: Option<&str>,
    ) -> Result<String, AuthorizationFailure> {
        let scope = requested_scope(parts, requested);

        if let Some(AttachedClient(client)) = parts.extensions.get::<AttachedClient>()
            && grants(client, &scope)
        {
            return Ok(scope);
        }

        if let Some(AttachedClientId(client_id)) = parts.extensions.get::<AttachedClientId>() {
            let client = self.fetch_client(client_id).await?;
            if !grants(&client, &scope) {
                tracing::info!(client_id, scope, "client not authorized for scope");
                return Err(AuthorizationFailure::ScopeDenied);
            }
            return Ok(scope);
        }

        Err(AuthorizationFailure::NoScopeInformation)
    }

    #[tracing::instrument(skip_all)]
    async fn user_authorization(&self, parts: &Parts) -> Result<String, AuthorizationFailure> {
        if let Some(AttachedClient(client)) = parts.extensions.get::<AttachedClient>() {
            return Ok(client.belongs_to_user.to_string());
        }

        match parts.extensions.get::<SessionInfo>() {
            Some(session) if session.is_banned() => Err(AuthorizationFailure::UserBanned),
            Some(session) => Ok(session.user_id.to_string()),
            None => Err(AuthorizationFailure::UserNotFound),
        }
    }

    fn internal_error(&self, err: &OAuth2Error) -> OAuth2Error {
        tracing::error!(error = %err, "oauth2 internal error");
        OAuth2Error::ServerError("Internal error".to_string())
    }

    fn response_error(&self, err: &OAuth2Error) {
        tracing::debug!(code = err.code(), error = %err, "oauth2 error response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{MockOAuth2ClientDataManager, fake_client};
    use axum::http::{Request, StatusCode};
    use todo_types::users::AccountStatus;

    fn authorizer(manager: MockOAuth2ClientDataManager) -> ClientAuthorizer {
        ClientAuthorizer::new(Arc::new(manager))
    }

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn password_grants_are_always_rejected() {
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(fake_client(
            "abc", "*",
        )));
        let result = auth
            .client_authorized("abc", GrantType::PasswordCredentials)
            .await;
        assert!(matches!(
            result,
            Err(AuthorizationFailure::GrantNotAllowed(
                GrantType::PasswordCredentials
            ))
        ));
    }

    #[tokio::test]
    async fn implicit_grants_need_the_client_flag() {
        let mut client = fake_client("abc", "items");
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(client.clone()));
        assert!(matches!(
            auth.client_authorized("abc", GrantType::Implicit).await,
            Err(AuthorizationFailure::ImplicitNotAllowed)
        ));

        client.implicit_allowed = true;
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(client));
        assert!(auth.client_authorized("abc", GrantType::Implicit).await.is_ok());
        assert!(
            auth.client_authorized("abc", GrantType::ClientCredentials)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn client_authorized_surfaces_lookup_failures() {
        let auth = authorizer(MockOAuth2ClientDataManager::default());
        assert!(matches!(
            auth.client_authorized("nope", GrantType::ClientCredentials)
                .await,
            Err(AuthorizationFailure::ClientNotFound)
        ));

        let auth = authorizer(MockOAuth2ClientDataManager::broken());
        let err = auth
            .client_authorized("abc", GrantType::ClientCredentials)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn client_scope_requires_every_requested_scope() {
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(fake_client(
            "abc",
            "items webhooks",
        )));
        assert!(auth.client_scope("abc", "items").await.is_ok());
        assert!(auth.client_scope("abc", "items webhooks").await.is_ok());
        assert!(matches!(
            auth.client_scope("abc", "users").await,
            Err(AuthorizationFailure::ScopeDenied)
        ));
    }

    #[tokio::test]
    async fn authorize_scope_approves_attached_client_with_scope() {
        let auth = authorizer(MockOAuth2ClientDataManager::default());
        let mut p = parts("/api/v1/items");
        p.extensions
            .insert(AttachedClient(fake_client("abc", "items")));

        assert_eq!(auth.authorize_scope(&p, None).await.unwrap(), "items");
    }

    #[tokio::test]
    async fn authorize_scope_falls_back_to_attached_client_id() {
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(fake_client(
            "abc", "items",
        )));

        let mut p = parts("/oauth2/authorize?scope=items");
        p.extensions.insert(AttachedClientId("abc".into()));
        assert_eq!(auth.authorize_scope(&p, None).await.unwrap(), "items");

        let mut p = parts("/oauth2/authorize?scope=users");
        p.extensions.insert(AttachedClientId("abc".into()));
        let err = auth.authorize_scope(&p, None).await.unwrap_err();
        assert!(matches!(err, AuthorizationFailure::ScopeDenied));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let mut p = parts("/oauth2/authorize?scope=items");
        p.extensions.insert(AttachedClientId("missing".into()));
        let err = auth.authorize_scope(&p, None).await.unwrap_err();
        assert!(matches!(err, AuthorizationFailure::ClientNotFound));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authorize_scope_prefers_the_decoded_request_scope() {
        let auth = authorizer(MockOAuth2ClientDataManager::with_client(fake_client(
            "abc", "items",
        )));

        let mut p = parts("/oauth2/authorize");
        p.extensions.insert(AttachedClientId("abc".into()));
        assert_eq!(auth.authorize_scope(&p, Some("items")).await.unwrap(), "items");

        let mut p = parts("/oauth2/authorize?scope=items");
        p.extensions.insert(AttachedClientId("abc".into()));
        assert!(matches!(
            auth.authorize_scope(&p, Some("users")).await,
            Err(AuthorizationFailure::ScopeDenied)
        ));
    }

    #[tokio::test]
    async fn authorize_scope_reports_store_failures() {
        let auth = authorizer(MockOAuth2ClientDataManager::broken());
        let mut p = parts("/oauth2/authorize?scope=items");
        p.extensions.insert(AttachedClientId("abc".into()));
        let err = auth.authorize_scope(&p, None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn authorize_scope_without_any_client_information() {
        let auth = authorizer(MockOAuth2ClientDataManager::default());
        let err = auth
            .authorize_scope(&parts("/api/v1/items"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizationFailure::NoScopeInformation));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_authorization_prefers_attached_client() {
        let auth = authorizer(MockOAuth2ClientDataManager::default());

        let mut p = parts("/oauth2/authorize");
        p.extensions.insert(AttachedClient(fake_client("abc", "*")));
        p.extensions.insert(SessionInfo {
            user_id: 7,
            user_is_admin: false,
            account_status: AccountStatus::Good,
        });
        assert_eq!(auth.user_authorization(&p).await.unwrap(), "42");
    }

    #[tokio::test]
    async fn user_authorization_uses_session_unless_banned() {
        let auth = authorizer(MockOAuth2ClientDataManager::default());

        let mut p = parts("/oauth2/authorize");
        p.extensions.insert(SessionInfo {
            user_id: 7,
            user_is_admin: false,
            account_status: AccountStatus::Good,
        });
        assert_eq!(auth.user_authorization(&p).await.unwrap(), "7");

        let mut p = parts("/oauth2/authorize");
        p.extensions.insert(SessionInfo {
            user_id: 7,
            user_is_admin: false,
            account_status: AccountStatus::Banned,
        });
        assert!(matches!(
            auth.user_authorization(&p).await,
            Err(AuthorizationFailure::UserBanned)
        ));

        assert!(matches!(
            auth.user_authorization(&parts("/oauth2/authorize")).await,
            Err(AuthorizationFailure::UserNotFound)
        ));
    }
}
