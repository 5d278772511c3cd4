//! Storage seams of the OAuth2 engine.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use time::OffsetDateTime;

use super::error::OAuth2Error;
use crate::entity::oauth2_token;

/// What the engine needs to know about a registered client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: String,
    pub secret: String,
    /// Registered redirect URI
    pub domain: String,
    pub user_id: String,
}

/// Looks up clients by their public `client_id`.
///
/// Unknown clients are reported as [`OAuth2Error::InvalidClient`].
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get_by_id(&self, client_id: &str) -> Result<ClientInfo, OAuth2Error>;
}

/// An issued bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub access_token: String,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub created_on: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl TokenInfo {
    pub fn is_expired(&self) -> bool {
        self.expires_at < OffsetDateTime::now_utc()
    }

    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.created_on).whole_seconds()
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create(&self, token: &TokenInfo) -> Result<(), OAuth2Error>;
    /// `Ok(None)` when the token was never issued or has been revoked.
    async fn get_by_access(&self, access_token: &str) -> Result<Option<TokenInfo>, OAuth2Error>;
}

/// Tokens persisted in `oauth2_tokens`, shared by every server instance.
#[derive(Clone, Debug)]
pub struct DbTokenStore {
    db: Arc<DatabaseConnection>,
}

impl DbTokenStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<oauth2_token::Model> for TokenInfo {
    fn from(token: oauth2_token::Model) -> Self {
        Self {
            access_token: token.access_token,
            client_id: token.client_id,
            user_id: token.user_id,
            scope: token.scope,
            created_on: token.created_on,
            expires_at: token.expires_at,
        }
    }
}

#[async_trait]
impl TokenStore for DbTokenStore {
    async fn create(&self, token: &TokenInfo) -> Result<(), OAuth2Error> {
        oauth2_token::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            access_token: Set(token.access_token.clone()),
            token_type: Set("Bearer".to_string()),
            client_id: Set(token.client_id.clone()),
            user_id: Set(token.user_id.clone()),
            scope: Set(token.scope.clone()),
            expires_at: Set(token.expires_at),
            created_on: Set(token.created_on),
            revoked_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| OAuth2Error::ServerError(format!("storing token: {e}")))?;

        Ok(())
    }

    async fn get_by_access(&self, access_token: &str) -> Result<Option<TokenInfo>, OAuth2Error> {
        let found = oauth2_token::Entity::find()
            .filter(oauth2_token::Column::AccessToken.eq(access_token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| OAuth2Error::ServerError(format!("loading token: {e}")))?;

        Ok(found.filter(|t| !t.is_revoked()).map(TokenInfo::from))
    }
}
