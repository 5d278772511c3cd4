use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: i32,
    pub name: String,
    pub plan_id: Option<i32>,
    pub belongs_to_user: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountList {
    pub accounts: Vec<Account>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountCreationInput {
    pub name: String,
    #[serde(default)]
    pub plan_id: Option<i32>,
}

impl Validate for AccountCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i32>,
}

impl Validate for AccountUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none() && self.plan_id.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validation::required("name", name)?;
        }
        Ok(())
    }
}
