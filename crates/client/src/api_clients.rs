use todo_types::QueryFilter;
use todo_types::api_clients::{
    ApiClient, ApiClientCreationInput, ApiClientCreationResponse, ApiClientList,
};
use todo_types::audit::AuditLogEntry;

use crate::{Client, ClientError};

const API_CLIENTS: &str = "/api/v1/api_clients";

impl Client {
    pub fn build_list_api_clients_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(API_CLIENTS, filter)
    }

    pub async fn list_api_clients(&self, filter: &QueryFilter) -> Result<ApiClientList, ClientError> {
        self.execute_json(self.build_list_api_clients_request(filter)?)
            .await
    }

    pub fn build_create_api_client_request(
        &self,
        input: &ApiClientCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(API_CLIENTS, input)
    }

    /// The returned secret cannot be fetched again.
    pub async fn create_api_client(
        &self,
        input: &ApiClientCreationInput,
    ) -> Result<ApiClientCreationResponse, ClientError> {
        self.execute_json(self.build_create_api_client_request(input)?)
            .await
    }

    pub fn build_get_api_client_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(API_CLIENTS, id)
    }

    pub async fn get_api_client(&self, id: i32) -> Result<ApiClient, ClientError> {
        self.execute_json(self.build_get_api_client_request(id)?)
            .await
    }

    pub fn build_archive_api_client_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.archive_request(API_CLIENTS, id)
    }

    pub async fn archive_api_client(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_api_client_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_api_client_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(API_CLIENTS, id)
    }

    pub async fn get_audit_log_for_api_client(
        &self,
        id: i32,
    ) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_api_client_request(id)?)
            .await
    }
}
