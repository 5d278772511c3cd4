use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;

use super::audit_log::{self, API_CLIENT_RESOURCE, AuditEvent};
use super::{ApiClientDataManager, DataError, ListPage, NewApiClient, Querier, fetch_page};
use crate::entity::{api_client, audit_log_entry};

#[async_trait]
impl ApiClientDataManager for Querier {
    async fn get_api_client(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<api_client::Model, DataError> {
        api_client::Entity::find_by_id(id)
            .filter(api_client::Column::BelongsToUser.eq(user_id))
            .filter(api_client::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_api_clients(
        &self,
        user_id: i32,
        filter: &ListFilter,
    ) -> Result<ListPage<api_client::Model>, DataError> {
        let mut select =
            api_client::Entity::find().filter(api_client::Column::BelongsToUser.eq(user_id));
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(api_client::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, api_client::Column::Id, filter).await?)
    }

    async fn create_api_client(&self, input: NewApiClient) -> Result<api_client::Model, DataError> {
        let txn = self.connection().begin().await?;
        let owner = input.belongs_to_user;

        let created = api_client::ActiveModel {
            name: Set(input.name),
            client_id: Set(input.client_id),
            secret_key: Set(input.secret_key),
            belongs_to_user: Set(owner),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(API_CLIENT_RESOURCE, "created", created.id, owner),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn archive_api_client(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = api_client::Entity::update_many()
            .col_expr(
                api_client::Column::ArchivedOn,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(api_client::Column::Id.eq(id))
            .filter(api_client::Column::BelongsToUser.eq(user_id))
            .filter(api_client::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(API_CLIENT_RESOURCE, "archived", id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_api_client(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), API_CLIENT_RESOURCE, id).await
    }
}
