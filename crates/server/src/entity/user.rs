//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use todo_types::users::{AccountStatus, User};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub password_last_changed_on: Option<OffsetDateTime>,
    pub requires_password_change: bool,
    /// Base32 TOTP secret
    #[serde(skip_serializing)]
    pub two_factor_secret: String,
    pub two_factor_secret_verified_on: Option<OffsetDateTime>,
    pub is_admin: bool,
    pub account_status: String,
    pub account_status_explanation: Option<String>,
    pub created_on: OffsetDateTime,
    pub last_updated_on: Option<OffsetDateTime>,
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unknown values in the column are treated as unverified.
    pub fn status(&self) -> AccountStatus {
        self.account_status.parse().unwrap_or_default()
    }

    pub fn is_banned(&self) -> bool {
        self.status().is_locked_out()
    }

    pub fn two_factor_verified(&self) -> bool {
        self.two_factor_secret_verified_on.is_some()
    }
}

impl From<Model> for User {
    fn from(user: Model) -> Self {
        let account_status = user.status();
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            account_status,
            account_status_explanation: user.account_status_explanation,
            requires_password_change: user.requires_password_change,
            password_last_changed_on: user.password_last_changed_on,
            two_factor_secret_verified_on: user.two_factor_secret_verified_on,
            created_on: user.created_on,
            last_updated_on: user.last_updated_on,
            archived_on: user.archived_on,
        }
    }
}
