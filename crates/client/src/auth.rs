//! Registration and the cookie session flow.

use reqwest::{Method, header};
use todo_types::users::{
    TotpSecretVerificationInput, UserCreationResponse, UserLoginInput, UserRegistrationInput,
    UserStatusResponse,
};

use crate::{Client, ClientError};

/// A successful login: the user's standing and the session cookie to send
/// back through [`Client::with_session_cookie`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    pub status: UserStatusResponse,
    /// `name=value` pair
    pub cookie: String,
}

impl Client {
    pub fn build_register_request(
        &self,
        input: &UserRegistrationInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::POST, "/users")?.json(input).build()?)
    }

    pub async fn register(
        &self,
        input: &UserRegistrationInput,
    ) -> Result<UserCreationResponse, ClientError> {
        self.execute_json(self.build_register_request(input)?)
            .await
    }

    pub fn build_verify_totp_secret_request(
        &self,
        input: &TotpSecretVerificationInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::POST, "/users/totp_secret/verify")?
            .json(input)
            .build()?)
    }

    pub async fn verify_totp_secret(
        &self,
        input: &TotpSecretVerificationInput,
    ) -> Result<(), ClientError> {
        self.execute_empty(self.build_verify_totp_secret_request(input)?)
            .await
    }

    pub fn build_login_request(
        &self,
        input: &UserLoginInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::POST, "/users/login")?
            .json(input)
            .build()?)
    }

    pub async fn login(&self, input: &UserLoginInput) -> Result<LoginResponse, ClientError> {
        let response = self.execute(self.build_login_request(input)?).await?;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
            .ok_or(ClientError::MissingHeader("Set-Cookie"))?;

        Ok(LoginResponse {
            status: response.json().await?,
            cookie,
        })
    }

    pub fn build_logout_request(&self) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::POST, "/users/logout")?.build()?)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute_empty(self.build_logout_request()?).await
    }

    pub fn build_status_request(&self) -> Result<reqwest::Request, ClientError> {
        Ok(self.request(Method::GET, "/auth/status")?.build()?)
    }

    pub async fn status(&self) -> Result<UserStatusResponse, ClientError> {
        self.execute_json(self.build_status_request()?).await
    }
}
