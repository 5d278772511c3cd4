//! OAuth2 Client entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::oauth2_clients::OAuth2Client;

use super::split_list;

/// Scope value granting access to every path.
pub const WILDCARD_SCOPE: &str = "*";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth2_clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    /// Space-separated list of allowed scopes
    pub scopes: String,
    pub implicit_allowed: bool,
    pub belongs_to_user: i32,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse scopes from space-separated string
    pub fn scopes_list(&self) -> Vec<String> {
        split_list(&self.scopes)
    }

    /// Check if the client may access `scope`
    pub fn has_scope(&self, scope: &str) -> bool {
        let scope = scope.trim();
        if scope.is_empty() {
            return false;
        }
        self.scopes
            .split_whitespace()
            .any(|s| s == scope || s == WILDCARD_SCOPE)
    }

    /// Check that every space-separated scope in `requested` is granted
    pub fn has_all_scopes(&self, requested: &str) -> bool {
        requested.split_whitespace().all(|s| self.has_scope(s))
    }
}

impl From<Model> for OAuth2Client {
    fn from(client: Model) -> Self {
        let scopes = client.scopes_list();
        Self {
            id: client.id,
            name: client.name,
            client_id: client.client_id,
            client_secret: String::new(),
            redirect_uri: client.redirect_uri,
            scopes,
            implicit_allowed: client.implicit_allowed,
            belongs_to_user: client.belongs_to_user,
            created_on: client.created_on,
            last_updated_on: client.last_updated_on,
            archived_on: client.archived_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(scopes: &str) -> Model {
        Model {
            id: 1,
            name: "ci".into(),
            client_id: "abc".into(),
            client_secret: "secret".into(),
            redirect_uri: String::new(),
            scopes: scopes.into(),
            implicit_allowed: false,
            belongs_to_user: 1,
            created_on: OffsetDateTime::now_utc(),
            last_updated_on: None,
            archived_on: None,
        }
    }

    #[test]
    fn has_scope_matches_exact_entries() {
        let c = client("items webhooks");
        assert!(c.has_scope("items"));
        assert!(c.has_scope("webhooks"));
        assert!(!c.has_scope("users"));
        assert!(!c.has_scope(""));
    }

    #[test]
    fn wildcard_scope_matches_everything() {
        let c = client("*");
        assert!(c.has_scope("items"));
        assert!(c.has_all_scopes("items users"));
    }

    #[test]
    fn has_all_scopes_requires_each() {
        let c = client("items");
        assert!(c.has_all_scopes("items"));
        assert!(!c.has_all_scopes("items users"));
    }
}
