use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
    sea_query::{Expr, Func},
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;
use todo_types::audit::FieldChangeSummary;
use todo_types::items::ItemCreationInput;

use super::audit_log::{self, AuditEvent, ITEM_RESOURCE};
use super::{DataError, ItemDataManager, ListPage, Querier, fetch_page};
use crate::entity::{audit_log_entry, item};

#[async_trait]
impl ItemDataManager for Querier {
    async fn item_exists(&self, id: i32, user_id: i32) -> Result<bool, DataError> {
        let count = item::Entity::find_by_id(id)
            .filter(item::Column::BelongsToUser.eq(user_id))
            .filter(item::Column::ArchivedOn.is_null())
            .count(self.connection())
            .await?;
        Ok(count > 0)
    }

    async fn get_item(&self, id: i32, user_id: i32) -> Result<item::Model, DataError> {
        item::Entity::find_by_id(id)
            .filter(item::Column::BelongsToUser.eq(user_id))
            .filter(item::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_items(
        &self,
        user_id: i32,
        filter: &ListFilter,
    ) -> Result<ListPage<item::Model>, DataError> {
        let mut select = item::Entity::find().filter(item::Column::BelongsToUser.eq(user_id));
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(item::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, item::Column::Id, filter).await?)
    }

    async fn search_items(
        &self,
        user_id: i32,
        query: &str,
        limit: u64,
    ) -> Result<Vec<item::Model>, DataError> {
        let pattern = format!("%{}%", query.to_lowercase());
        Ok(item::Entity::find()
            .filter(item::Column::BelongsToUser.eq(user_id))
            .filter(item::Column::ArchivedOn.is_null())
            .filter(Expr::expr(Func::lower(Expr::col(item::Column::Name))).like(pattern))
            .limit(limit)
            .all(self.connection())
            .await?)
    }

    async fn create_item(
        &self,
        input: &ItemCreationInput,
        user_id: i32,
    ) -> Result<item::Model, DataError> {
        let txn = self.connection().begin().await?;

        let created = item::ActiveModel {
            name: Set(input.name.clone()),
            details: Set(input.details.clone()),
            belongs_to_user: Set(user_id),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(ITEM_RESOURCE, "created", created.id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_item(
        &self,
        updated: &item::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<item::Model, DataError> {
        let txn = self.connection().begin().await?;

        let saved = item::ActiveModel {
            id: Unchanged(updated.id),
            name: Set(updated.name.clone()),
            details: Set(updated.details.clone()),
            last_updated_on: Set(Some(OffsetDateTime::now_utc())),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(ITEM_RESOURCE, "updated", updated.id, updated.belongs_to_user)
                .with_changes(&changes),
        )
        .await?;

        txn.commit().await?;
        Ok(saved)
    }

    async fn archive_item(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = item::Entity::update_many()
            .col_expr(item::Column::ArchivedOn, Expr::value(OffsetDateTime::now_utc()))
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::BelongsToUser.eq(user_id))
            .filter(item::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(&txn, AuditEvent::new(ITEM_RESOURCE, "archived", id, user_id)).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_item(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), ITEM_RESOURCE, id).await
    }
}
