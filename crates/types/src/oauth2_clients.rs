use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

/// A registered machine identity allowed to use the client-credentials grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OAuth2Client {
    pub id: i32,
    pub name: String,
    pub client_id: String,
    /// Only populated in the creation response
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub implicit_allowed: bool,
    pub belongs_to_user: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OAuth2ClientList {
    pub clients: Vec<OAuth2Client>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

/// Creating a client re-authenticates the requesting user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OAuth2ClientCreationInput {
    pub name: String,
    pub username: String,
    pub password: String,
    pub totp_token: String,
    #[serde(default)]
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    #[serde(default)]
    pub implicit_allowed: bool,
}

impl Validate for OAuth2ClientCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::required("username", &self.username)?;
        validation::required("password", &self.password)?;
        validation::totp_token("totp_token", &self.totp_token)?;
        if !self.redirect_uri.is_empty() {
            validation::http_url("redirect_uri", &self.redirect_uri)?;
        }
        if self.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(ValidationError::Required("scopes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> OAuth2ClientCreationInput {
        OAuth2ClientCreationInput {
            name: "ci runner".into(),
            username: "alice".into(),
            password: "hunter2hunter2".into(),
            totp_token: "123456".into(),
            redirect_uri: String::new(),
            scopes: vec!["items".into()],
            implicit_allowed: false,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn scopes_are_required() {
        let mut x = input();
        x.scopes = vec![" ".into()];
        assert_eq!(x.validate(), Err(ValidationError::Required("scopes")));
    }
}
