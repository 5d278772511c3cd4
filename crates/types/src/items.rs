use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub details: String,
    pub belongs_to_user: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemCreationInput {
    pub name: String,
    #[serde(default)]
    pub details: String,
}

impl Validate for ItemCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Validate for ItemUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none() && self.details.is_none() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validation::required("name", name)?;
        }
        Ok(())
    }
}

/// `?q=` parameter of the search endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}
