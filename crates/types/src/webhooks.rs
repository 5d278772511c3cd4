use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

const ALLOWED_METHODS: [&str; 4] = ["GET", "POST", "PUT", "PATCH"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Webhook {
    pub id: i32,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    pub belongs_to_user: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookList {
    pub webhooks: Vec<Webhook>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookCreationInput {
    pub name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub data_types: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_method() -> String {
    "POST".to_string()
}

fn check_method(method: &str) -> Result<(), ValidationError> {
    if !ALLOWED_METHODS.contains(&method) {
        return Err(ValidationError::Invalid {
            field: "method",
            reason: "must be one of GET, POST, PUT, PATCH",
        });
    }
    Ok(())
}

impl Validate for WebhookCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::http_url("url", &self.url)?;
        check_method(&self.method)?;
        if self.events.is_empty() {
            return Err(ValidationError::Required("events"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookUpdateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
}

impl Validate for WebhookUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if *self == WebhookUpdateInput::default() {
            return Err(ValidationError::EmptyUpdate);
        }
        if let Some(name) = &self.name {
            validation::required("name", name)?;
        }
        if let Some(url) = &self.url {
            validation::http_url("url", url)?;
        }
        if let Some(method) = &self.method {
            check_method(method)?;
        }
        Ok(())
    }
}
