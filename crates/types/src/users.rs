use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::Pagination;
use crate::validation::{self, Validate, ValidationError};

/// Standing of a user account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Good,
    #[default]
    Unverified,
    Banned,
    Terminated,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Good => "good",
            AccountStatus::Unverified => "unverified",
            AccountStatus::Banned => "banned",
            AccountStatus::Terminated => "terminated",
        }
    }

    /// Banned and terminated accounts may not authenticate.
    pub fn is_locked_out(&self) -> bool {
        matches!(self, AccountStatus::Banned | AccountStatus::Terminated)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(AccountStatus::Good),
            "unverified" => Ok(AccountStatus::Unverified),
            "banned" => Ok(AccountStatus::Banned),
            "terminated" => Ok(AccountStatus::Terminated),
            _ => Err(ValidationError::Invalid {
                field: "account_status",
                reason: "unknown status",
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub account_status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_status_explanation: Option<String>,
    pub requires_password_change: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub password_last_changed_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub two_factor_secret_verified_on: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated_on: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub archived_on: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<User>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRegistrationInput {
    pub username: String,
    pub password: String,
}

impl UserRegistrationInput {
    pub fn validate_with(
        &self,
        minimum_username_length: usize,
        minimum_password_length: usize,
    ) -> Result<(), ValidationError> {
        validation::required("username", &self.username)?;
        validation::min_length("username", &self.username, minimum_username_length)?;
        validation::required("password", &self.password)?;
        validation::min_length("password", &self.password, minimum_password_length)
    }
}

/// Returned once at registration; the secret is never shown again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserCreationResponse {
    pub id: i32,
    pub username: String,
    pub account_status: AccountStatus,
    /// Base32 TOTP secret to load into an authenticator app
    pub two_factor_secret: String,
    /// `otpauth://` provisioning URI for the secret
    pub two_factor_uri: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserLoginInput {
    pub username: String,
    pub password: String,
    pub totp_token: String,
}

impl UserLoginInput {
    pub fn validate_with(
        &self,
        minimum_username_length: usize,
        minimum_password_length: usize,
    ) -> Result<(), ValidationError> {
        validation::min_length("username", &self.username, minimum_username_length)?;
        validation::min_length("password", &self.password, minimum_password_length)?;
        validation::totp_token("totp_token", &self.totp_token)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TotpSecretVerificationInput {
    pub user_id: i32,
    pub totp_token: String,
}

impl Validate for TotpSecretVerificationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::Required("user_id"));
        }
        validation::totp_token("totp_token", &self.totp_token)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TotpSecretRefreshInput {
    pub current_password: String,
    pub totp_token: String,
}

impl Validate for TotpSecretRefreshInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("current_password", &self.current_password)?;
        validation::totp_token("totp_token", &self.totp_token)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TotpSecretRefreshResponse {
    pub two_factor_secret: String,
    pub two_factor_uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PasswordUpdateInput {
    pub current_password: String,
    pub totp_token: String,
    pub new_password: String,
}

impl Validate for PasswordUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("current_password", &self.current_password)?;
        validation::totp_token("totp_token", &self.totp_token)?;
        validation::required("new_password", &self.new_password)?;
        if self.new_password == self.current_password {
            return Err(ValidationError::Invalid {
                field: "new_password",
                reason: "must differ from the current password",
            });
        }
        Ok(())
    }
}

/// Answer to `GET /auth/status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserStatusResponse {
    pub authenticated: bool,
    pub user_is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_status: Option<AccountStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserReputationUpdateInput {
    pub target_user_id: i32,
    pub new_status: AccountStatus,
    pub reason: String,
}

impl Validate for UserReputationUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.target_user_id <= 0 {
            return Err(ValidationError::Required("target_user_id"));
        }
        validation::required("reason", &self.reason)
    }
}
