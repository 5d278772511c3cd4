//! OAuth2 client management and the protocol endpoints.

use reqwest::{Method, header};
use serde::Serialize;
use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::oauth2::TokenResponse;
use todo_types::oauth2_clients::{OAuth2Client, OAuth2ClientCreationInput, OAuth2ClientList};
use url::Url;

use crate::{Client, ClientError};

const OAUTH2_CLIENTS: &str = "/api/v1/oauth2/clients";

/// Query parameters of `GET /oauth2/authorize`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizeParams {
    /// `token` for the implicit flow
    pub response_type: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Serialize)]
struct ClientCredentialsGrant<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

impl Client {
    pub fn build_list_oauth2_clients_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(OAUTH2_CLIENTS, filter)
    }

    pub async fn list_oauth2_clients(
        &self,
        filter: &QueryFilter,
    ) -> Result<OAuth2ClientList, ClientError> {
        self.execute_json(self.build_list_oauth2_clients_request(filter)?)
            .await
    }

    pub fn build_create_oauth2_client_request(
        &self,
        input: &OAuth2ClientCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(OAUTH2_CLIENTS, input)
    }

    /// The response is the only place `client_secret` is ever filled in.
    pub async fn create_oauth2_client(
        &self,
        input: &OAuth2ClientCreationInput,
    ) -> Result<OAuth2Client, ClientError> {
        self.execute_json(self.build_create_oauth2_client_request(input)?)
            .await
    }

    pub fn build_get_oauth2_client_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.read_request(OAUTH2_CLIENTS, id)
    }

    pub async fn get_oauth2_client(&self, id: i32) -> Result<OAuth2Client, ClientError> {
        self.execute_json(self.build_get_oauth2_client_request(id)?)
            .await
    }

    pub fn build_archive_oauth2_client_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.archive_request(OAUTH2_CLIENTS, id)
    }

    pub async fn archive_oauth2_client(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_oauth2_client_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_oauth2_client_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(OAUTH2_CLIENTS, id)
    }

    pub async fn get_audit_log_for_oauth2_client(
        &self,
        id: i32,
    ) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_oauth2_client_request(id)?)
            .await
    }

    pub fn build_fetch_token_request(
        &self,
        client_id: &str,
        client_secret: &str,
        scopes: &[&str],
    ) -> Result<reqwest::Request, ClientError> {
        let grant = ClientCredentialsGrant {
            grant_type: "client_credentials",
            client_id,
            client_secret,
            scope: (!scopes.is_empty()).then(|| scopes.join(" ")),
        };
        Ok(self
            .http
            .post(self.url("/oauth2/token")?)
            .form(&grant)
            .build()?)
    }

    /// Runs the client-credentials grant and uses the issued token for every
    /// later request.
    pub async fn fetch_token(
        &mut self,
        client_id: &str,
        client_secret: &str,
        scopes: &[&str],
    ) -> Result<TokenResponse, ClientError> {
        let token: TokenResponse = self
            .execute_json(self.build_fetch_token_request(client_id, client_secret, scopes)?)
            .await?;
        self.set_bearer_token(token.access_token.clone());
        Ok(token)
    }

    pub fn build_authorize_request(
        &self,
        params: &AuthorizeParams,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, "/oauth2/authorize")?
            .query(params)
            .build()?)
    }

    /// Returns the redirect target, which carries the token (or the error) in
    /// its fragment.
    pub async fn authorize(&self, params: &AuthorizeParams) -> Result<Url, ClientError> {
        let response = self.execute(self.build_authorize_request(params)?).await?;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ClientError::MissingHeader("Location"))?;
        Ok(Url::parse(location)?)
    }
}
