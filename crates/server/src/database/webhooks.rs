use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;
use todo_types::audit::FieldChangeSummary;
use todo_types::webhooks::WebhookCreationInput;

use super::audit_log::{self, AuditEvent, WEBHOOK_RESOURCE};
use super::{DataError, ListPage, Querier, WebhookDataManager, fetch_page};
use crate::entity::{audit_log_entry, join_list, webhook};

#[async_trait]
impl WebhookDataManager for Querier {
    async fn get_webhook(&self, id: i32, user_id: i32) -> Result<webhook::Model, DataError> {
        webhook::Entity::find_by_id(id)
            .filter(webhook::Column::BelongsToUser.eq(user_id))
            .filter(webhook::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_webhooks(
        &self,
        user_id: i32,
        filter: &ListFilter,
    ) -> Result<ListPage<webhook::Model>, DataError> {
        let mut select =
            webhook::Entity::find().filter(webhook::Column::BelongsToUser.eq(user_id));
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(webhook::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, webhook::Column::Id, filter).await?)
    }

    async fn create_webhook(
        &self,
        input: &WebhookCreationInput,
        user_id: i32,
    ) -> Result<webhook::Model, DataError> {
        let txn = self.connection().begin().await?;

        let created = webhook::ActiveModel {
            name: Set(input.name.clone()),
            content_type: Set(input.content_type.clone()),
            url: Set(input.url.clone()),
            method: Set(input.method.clone()),
            events: Set(join_list(&input.events)),
            data_types: Set(join_list(&input.data_types)),
            topics: Set(join_list(&input.topics)),
            belongs_to_user: Set(user_id),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(WEBHOOK_RESOURCE, "created", created.id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_webhook(
        &self,
        updated: &webhook::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<webhook::Model, DataError> {
        let txn = self.connection().begin().await?;

        let saved = webhook::ActiveModel {
            id: Unchanged(updated.id),
            name: Set(updated.name.clone()),
            content_type: Set(updated.content_type.clone()),
            url: Set(updated.url.clone()),
            method: Set(updated.method.clone()),
            events: Set(updated.events.clone()),
            data_types: Set(updated.data_types.clone()),
            topics: Set(updated.topics.clone()),
            last_updated_on: Set(Some(OffsetDateTime::now_utc())),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(
                WEBHOOK_RESOURCE,
                "updated",
                updated.id,
                updated.belongs_to_user,
            )
            .with_changes(&changes),
        )
        .await?;

        txn.commit().await?;
        Ok(saved)
    }

    async fn archive_webhook(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = webhook::Entity::update_many()
            .col_expr(
                webhook::Column::ArchivedOn,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(webhook::Column::Id.eq(id))
            .filter(webhook::Column::BelongsToUser.eq(user_id))
            .filter(webhook::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(WEBHOOK_RESOURCE, "archived", id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_webhook(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), WEBHOOK_RESOURCE, id).await
    }
}
