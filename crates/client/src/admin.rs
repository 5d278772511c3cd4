use reqwest::Method;
use todo_types::QueryFilter;
use todo_types::audit::{AuditLogEntry, AuditLogEntryList};
use todo_types::users::UserReputationUpdateInput;

use crate::{Client, ClientError};

const ADMIN: &str = "/api/v1/admin";

impl Client {
    pub fn build_list_audit_log_entries_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(&format!("{ADMIN}/audit_log"), filter)
    }

    pub async fn list_audit_log_entries(
        &self,
        filter: &QueryFilter,
    ) -> Result<AuditLogEntryList, ClientError> {
        self.execute_json(self.build_list_audit_log_entries_request(filter)?)
            .await
    }

    pub fn build_get_audit_log_entry_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.read_request(&format!("{ADMIN}/audit_log"), id)
    }

    pub async fn get_audit_log_entry(&self, id: i32) -> Result<AuditLogEntry, ClientError> {
        self.execute_json(self.build_get_audit_log_entry_request(id)?)
            .await
    }

    pub fn build_update_user_status_request(
        &self,
        input: &UserReputationUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::POST, &format!("{ADMIN}/users/status"))?
            .json(input)
            .build()?)
    }

    pub async fn update_user_status(
        &self,
        input: &UserReputationUpdateInput,
    ) -> Result<(), ClientError> {
        self.execute_empty(self.build_update_user_status_request(input)?)
            .await
    }
}
