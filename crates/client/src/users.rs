use reqwest::Method;
use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::items::SearchQuery;
use todo_types::users::{
    PasswordUpdateInput, TotpSecretRefreshInput, TotpSecretRefreshResponse, User, UserList,
};

use crate::{Client, ClientError};

const USERS: &str = "/api/v1/users";

impl Client {
    pub fn build_list_users_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(USERS, filter)
    }

    /// Admin only.
    pub async fn list_users(&self, filter: &QueryFilter) -> Result<UserList, ClientError> {
        self.execute_json(self.build_list_users_request(filter)?)
            .await
    }

    pub fn build_search_users_request(
        &self,
        query: &SearchQuery,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, &format!("{USERS}/search"))?
            .query(query)
            .build()?)
    }

    /// Admin only.
    pub async fn search_users(&self, query: &SearchQuery) -> Result<Vec<User>, ClientError> {
        self.execute_json(self.build_search_users_request(query)?)
            .await
    }

    pub fn build_self_request(&self) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, &format!("{USERS}/self"))?
            .build()?)
    }

    /// The user behind the current cookie or token.
    pub async fn self_user(&self) -> Result<User, ClientError> {
        self.execute_json(self.build_self_request()?).await
    }

    pub fn build_get_user_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(USERS, id)
    }

    pub async fn get_user(&self, id: i32) -> Result<User, ClientError> {
        self.execute_json(self.build_get_user_request(id)?).await
    }

    pub fn build_archive_user_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.archive_request(USERS, id)
    }

    pub async fn archive_user(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_user_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_user_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(USERS, id)
    }

    pub async fn get_audit_log_for_user(&self, id: i32) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_user_request(id)?)
            .await
    }

    pub fn build_new_totp_secret_request(
        &self,
        input: &TotpSecretRefreshInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::POST, &format!("{USERS}/totp_secret/new"))?
            .json(input)
            .build()?)
    }

    /// The new secret has to be verified again before the next login.
    pub async fn new_totp_secret(
        &self,
        input: &TotpSecretRefreshInput,
    ) -> Result<TotpSecretRefreshResponse, ClientError> {
        self.execute_json(self.build_new_totp_secret_request(input)?)
            .await
    }

    pub fn build_update_password_request(
        &self,
        input: &PasswordUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::PUT, &format!("{USERS}/password/new"))?
            .json(input)
            .build()?)
    }

    pub async fn update_password(&self, input: &PasswordUpdateInput) -> Result<(), ClientError> {
        self.execute_empty(self.build_update_password_request(input)?)
            .await
    }
}
