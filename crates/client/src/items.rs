use reqwest::{Method, StatusCode};
use todo_types::QueryFilter;
use todo_types::audit::AuditLogEntry;
use todo_types::items::{Item, ItemCreationInput, ItemList, ItemUpdateInput, SearchQuery};

use crate::{Client, ClientError};

const ITEMS: &str = "/api/v1/items";

impl Client {
    pub fn build_list_items_request(
        &self,
        filter: &QueryFilter,
    ) -> Result<reqwest::Request, ClientError> {
        self.list_request(ITEMS, filter)
    }

    pub async fn list_items(&self, filter: &QueryFilter) -> Result<ItemList, ClientError> {
        self.execute_json(self.build_list_items_request(filter)?)
            .await
    }

    pub fn build_create_item_request(
        &self,
        input: &ItemCreationInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.create_request(ITEMS, input)
    }

    pub async fn create_item(&self, input: &ItemCreationInput) -> Result<Item, ClientError> {
        self.execute_json(self.build_create_item_request(input)?)
            .await
    }

    pub fn build_search_items_request(
        &self,
        query: &SearchQuery,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::GET, &format!("{ITEMS}/search"))?
            .query(query)
            .build()?)
    }

    pub async fn search_items(&self, query: &SearchQuery) -> Result<Vec<Item>, ClientError> {
        self.execute_json(self.build_search_items_request(query)?)
            .await
    }

    pub fn build_item_exists_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        Ok(self
            .request(Method::HEAD, &format!("{ITEMS}/{id}"))?
            .build()?)
    }

    /// `Ok(false)` when the server answers 404.
    pub async fn item_exists(&self, id: i32) -> Result<bool, ClientError> {
        match self.execute(self.build_item_exists_request(id)?).await {
            Ok(response) => Ok(response.status() == StatusCode::OK),
            Err(ClientError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn build_get_item_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.read_request(ITEMS, id)
    }

    pub async fn get_item(&self, id: i32) -> Result<Item, ClientError> {
        self.execute_json(self.build_get_item_request(id)?).await
    }

    pub fn build_update_item_request(
        &self,
        id: i32,
        input: &ItemUpdateInput,
    ) -> Result<reqwest::Request, ClientError> {
        self.update_request(ITEMS, id, input)
    }

    pub async fn update_item(&self, id: i32, input: &ItemUpdateInput) -> Result<Item, ClientError> {
        self.execute_json(self.build_update_item_request(id, input)?)
            .await
    }

    pub fn build_archive_item_request(&self, id: i32) -> Result<reqwest::Request, ClientError> {
        self.archive_request(ITEMS, id)
    }

    pub async fn archive_item(&self, id: i32) -> Result<(), ClientError> {
        self.execute_empty(self.build_archive_item_request(id)?)
            .await
    }

    pub fn build_get_audit_log_for_item_request(
        &self,
        id: i32,
    ) -> Result<reqwest::Request, ClientError> {
        self.audit_request(ITEMS, id)
    }

    pub async fn get_audit_log_for_item(&self, id: i32) -> Result<Vec<AuditLogEntry>, ClientError> {
        self.execute_json(self.build_get_audit_log_for_item_request(id)?)
            .await
    }
}
