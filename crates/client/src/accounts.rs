use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::accounts::{Account, AccountCreationInput, AccountList, AccountUpdateInput};

use crate::{Client, ClientError};

const ACCOUNTS: &str = "/api/v1/accounts";

impl Client {
    pub fn build_list_accounts_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(ACCOUNTS, filter)
    }

    pub async fn list_accounts(&self, filter: &QueryFilter) -> Result<AccountList, ClientError> {
        self.execute_json(self.build_list_accounts_request(filter)?)
            .await
    }

    pub fn build_create_account_request(
        &self,
        input: &AccountCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(ACCOUNTS, input)
    }

    pub async fn create_account(&self, input: &AccountCreationInput) -> Result<Account, ClientError> {
        self.execute_json(self.build_create_account_request(input)?)
            .await
    }

    pub fn build_get_account_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(ACCOUNTS, id)
    }

    pub async fn get_account(&self, id: i32) -> Result<Account, ClientError> {
        self.execute_json(self.build_get_account_request(id)?).await
    }

    pub fn build_update_account_request(
        &self,
        id: i32,
        input: &AccountUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.update_request(ACCOUNTS, id, input)
    }

    pub async fn update_account(
        &self,
        id: i32,
        input: &AccountUpdateInput,
    ) -> Result<Account, ClientError> {
        self.execute_json(self.build_update_account_request(id, input)?)
            .await
    }

    pub fn build_archive_account_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.archive_request(ACCOUNTS, id)
    }

    pub async fn archive_account(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_account_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_account_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(ACCOUNTS, id)
    }

    pub async fn get_audit_log_for_account(
        &self,
        id: i32,
    ) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_account_request(id)?)
            .await
    }
}
