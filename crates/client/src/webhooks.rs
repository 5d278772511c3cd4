use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::webhooks::{Webhook, WebhookCreationInput, WebhookList, WebhookUpdateInput};

use crate::{Client, ClientError};

const WEBHOOKS: &str = "/api/v1/webhooks";

impl Client {
    pub fn build_list_webhooks_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(WEBHOOKS, filter)
    }

    pub async fn list_webhooks(&self, filter: &QueryFilter) -> Result<WebhookList, ClientError> {
        self.execute_json(self.build_list_webhooks_request(filter)?)
            .await
    }

    pub fn build_create_webhook_request(
        &self,
        input: &WebhookCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(WEBHOOKS, input)
    }

    pub async fn create_webhook(&self, input: &WebhookCreationInput) -> Result<Webhook, ClientError> {
        self.execute_json(self.build_create_webhook_request(input)?)
            .await
    }

    pub fn build_get_webhook_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(WEBHOOKS, id)
    }

    pub async fn get_webhook(&self, id: i32) -> Result<Webhook, ClientError> {
        self.execute_json(self.build_get_webhook_request(id)?).await
    }

    pub fn build_update_webhook_request(
        &self,
        id: i32,
        input: &WebhookUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.update_request(WEBHOOKS, id, input)
    }

    pub async fn update_webhook(
        &self,
        id: i32,
        input: &WebhookUpdateInput,
    ) -> Result<Webhook, ClientError> {
        self.execute_json(self.build_update_webhook_request(id, input)?)
            .await
    }

    pub fn build_archive_webhook_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.archive_request(WEBHOOKS, id)
    }

    pub async fn archive_webhook(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_webhook_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_webhook_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(WEBHOOKS, id)
    }

    pub async fn get_audit_log_for_webhook(
        &self,
        id: i32,
    ) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_webhook_request(id)?)
            .await
    }
}
