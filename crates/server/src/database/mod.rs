//! Persistent storage behind one trait per entity.
//!
//! Services only ever see the `*DataManager` traits; [`Querier`] is the
//! sea-orm backed implementation used in production and in integration tests.
//! A missing (or archived) row is always reported as [`DataError::NotFound`].

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryOrder,
    QuerySelect, Select, SqlErr,
};
use thiserror::Error;
use todo_types::audit::FieldChangeSummary;
use todo_types::users::AccountStatus;
use todo_types::{Pagination, QueryFilter, SortOrder};

use crate::entity::{
    account, api_client, audit_log_entry, item, oauth2_client, plan, session, user, webhook,
};

mod accounts;
mod api_clients;
pub mod audit_log;
mod items;
#[cfg(test)]
pub(crate) mod mock;
mod oauth2_clients;
mod plans;
mod sessions;
mod users;
mod webhooks;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no rows found")]
    NotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error("database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for DataError {
    fn from(err: DbErr) -> Self {
        if matches!(err, DbErr::RecordNotUpdated) {
            return DataError::NotFound;
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DataError::Conflict,
            _ => DataError::Database(err),
        }
    }
}

impl DataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound)
    }
}

/// One page of a list query.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
}

impl<T> ListPage<T> {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total_count: self.total_count,
        }
    }
}

pub(crate) async fn fetch_page<E, C>(
    conn: &C,
    select: Select<E>,
    order_column: E::Column,
    filter: &QueryFilter,
) -> Result<ListPage<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let total_count = select.clone().count(conn).await?;
    let order = match filter.sort_by() {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let items = select
        .order_by(order_column, order)
        .offset(filter.offset())
        .limit(filter.limit())
        .all(conn)
        .await?;

    Ok(ListPage {
        items,
        page: filter.page(),
        limit: filter.limit(),
        total_count,
    })
}

/// Fields of a user about to be registered.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub hashed_password: String,
    pub two_factor_secret: String,
}

/// Fields of an OAuth2 client about to be persisted.
#[derive(Clone, Debug)]
pub struct NewOAuth2Client {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub implicit_allowed: bool,
    pub belongs_to_user: i32,
}

#[derive(Clone, Debug)]
pub struct NewApiClient {
    pub name: String,
    pub client_id: String,
    pub secret_key: String,
    pub belongs_to_user: i32,
}

#[async_trait]
pub trait UserDataManager: Send + Sync {
    async fn get_user(&self, user_id: i32) -> Result<user::Model, DataError>;
    async fn get_user_by_username(&self, username: &str) -> Result<user::Model, DataError>;
    async fn search_users_by_username(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<user::Model>, DataError>;
    async fn get_users(&self, filter: &QueryFilter) -> Result<ListPage<user::Model>, DataError>;
    async fn create_user(&self, input: NewUser) -> Result<user::Model, DataError>;
    async fn update_user_password(
        &self,
        user_id: i32,
        hashed_password: &str,
    ) -> Result<(), DataError>;
    async fn update_two_factor_secret(&self, user_id: i32, secret: &str)
    -> Result<(), DataError>;
    async fn mark_two_factor_secret_verified(&self, user_id: i32) -> Result<(), DataError>;
    async fn update_user_reputation(
        &self,
        user_id: i32,
        status: AccountStatus,
        reason: &str,
        performed_by: i32,
    ) -> Result<(), DataError>;
    async fn archive_user(&self, user_id: i32, performed_by: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait SessionDataManager: Send + Sync {
    async fn create_session(
        &self,
        user_id: i32,
        lifetime: time::Duration,
    ) -> Result<session::Model, DataError>;
    async fn get_session(&self, token: &str) -> Result<session::Model, DataError>;
    async fn delete_session(&self, token: &str) -> Result<(), DataError>;
}

#[async_trait]
pub trait OAuth2ClientDataManager: Send + Sync {
    async fn get_oauth2_client(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<oauth2_client::Model, DataError>;
    async fn get_oauth2_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<oauth2_client::Model, DataError>;
    async fn get_oauth2_clients(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<oauth2_client::Model>, DataError>;
    async fn create_oauth2_client(
        &self,
        input: NewOAuth2Client,
    ) -> Result<oauth2_client::Model, DataError>;
    async fn archive_oauth2_client(&self, id: i32, user_id: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_oauth2_client(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait ApiClientDataManager: Send + Sync {
    async fn get_api_client(&self, id: i32, user_id: i32)
    -> Result<api_client::Model, DataError>;
    async fn get_api_clients(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<api_client::Model>, DataError>;
    async fn create_api_client(&self, input: NewApiClient) -> Result<api_client::Model, DataError>;
    async fn archive_api_client(&self, id: i32, user_id: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_api_client(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait ItemDataManager: Send + Sync {
    async fn item_exists(&self, id: i32, user_id: i32) -> Result<bool, DataError>;
    async fn get_item(&self, id: i32, user_id: i32) -> Result<item::Model, DataError>;
    async fn get_items(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<item::Model>, DataError>;
    async fn search_items(
        &self,
        user_id: i32,
        query: &str,
        limit: u64,
    ) -> Result<Vec<item::Model>, DataError>;
    async fn create_item(
        &self,
        input: &todo_types::items::ItemCreationInput,
        user_id: i32,
    ) -> Result<item::Model, DataError>;
    async fn update_item(
        &self,
        updated: &item::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<item::Model, DataError>;
    async fn archive_item(&self, id: i32, user_id: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_item(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait WebhookDataManager: Send + Sync {
    async fn get_webhook(&self, id: i32, user_id: i32) -> Result<webhook::Model, DataError>;
    async fn get_webhooks(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<webhook::Model>, DataError>;
    async fn create_webhook(
        &self,
        input: &todo_types::webhooks::WebhookCreationInput,
        user_id: i32,
    ) -> Result<webhook::Model, DataError>;
    async fn update_webhook(
        &self,
        updated: &webhook::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<webhook::Model, DataError>;
    async fn archive_webhook(&self, id: i32, user_id: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_webhook(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait AccountDataManager: Send + Sync {
    async fn get_account(&self, id: i32, user_id: i32) -> Result<account::Model, DataError>;
    async fn get_accounts(
        &self,
        user_id: i32,
        filter: &QueryFilter,
    ) -> Result<ListPage<account::Model>, DataError>;
    async fn create_account(
        &self,
        input: &todo_types::accounts::AccountCreationInput,
        user_id: i32,
    ) -> Result<account::Model, DataError>;
    async fn update_account(
        &self,
        updated: &account::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<account::Model, DataError>;
    async fn archive_account(&self, id: i32, user_id: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_account(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait PlanDataManager: Send + Sync {
    async fn get_plan(&self, id: i32) -> Result<plan::Model, DataError>;
    async fn get_plans(&self, filter: &QueryFilter) -> Result<ListPage<plan::Model>, DataError>;
    async fn create_plan(
        &self,
        input: &todo_types::plans::PlanCreationInput,
        performed_by: i32,
    ) -> Result<plan::Model, DataError>;
    async fn update_plan(
        &self,
        updated: &plan::Model,
        changes: Vec<FieldChangeSummary>,
        performed_by: i32,
    ) -> Result<plan::Model, DataError>;
    async fn archive_plan(&self, id: i32, performed_by: i32) -> Result<(), DataError>;
    async fn get_audit_log_entries_for_plan(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError>;
}

#[async_trait]
pub trait AuditLogEntryDataManager: Send + Sync {
    async fn get_audit_log_entry(&self, id: i32) -> Result<audit_log_entry::Model, DataError>;
    async fn get_audit_log_entries(
        &self,
        filter: &QueryFilter,
    ) -> Result<ListPage<audit_log_entry::Model>, DataError>;
}

/// sea-orm implementation of every data manager.
#[derive(Clone, Debug)]
pub struct Querier {
    db: Arc<DatabaseConnection>,
}

impl Querier {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Round-trips a trivial query; used by the readiness probe.
    pub async fn ping(&self) -> Result<(), DataError> {
        self.db.ping().await.map_err(DataError::from)
    }
}
