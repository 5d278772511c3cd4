//! OAuth2 Token entity - bearer tokens issued by the token endpoint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth2_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub access_token: String,
    pub token_type: String,
    /// Public `client_id` of the client the token was issued to
    pub client_id: String,
    /// Owning user id, as a string
    pub user_id: String,
    pub scope: String,
    pub expires_at: OffsetDateTime,
    pub created_on: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}
