use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiClient {
    pub id: i32,
    pub name: String,
    pub client_id: String,
    pub belongs_to_user: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiClientList {
    pub clients: Vec<ApiClient>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiClientCreationInput {
    pub name: String,
    pub username: String,
    pub password: String,
    pub totp_token: String,
}

impl Validate for ApiClientCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::required("username", &self.username)?;
        validation::required("password", &self.password)?;
        validation::totp_token("totp_token", &self.totp_token)
    }
}

/// The secret key is only ever returned here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiClientCreationResponse {
    pub id: i32,
    pub client_id: String,
    pub client_secret: String,
}
