use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;
use todo_types::accounts::AccountCreationInput;
use todo_types::audit::FieldChangeSummary;

use super::audit_log::{self, ACCOUNT_RESOURCE, AuditEvent};
use super::{AccountDataManager, DataError, ListPage, Querier, fetch_page};
use crate::entity::{account, audit_log_entry};

#[async_trait]
impl AccountDataManager for Querier {
    async fn get_account(&self, id: i32, user_id: i32) -> Result<account::Model, DataError> {
        account::Entity::find_by_id(id)
            .filter(account::Column::BelongsToUser.eq(user_id))
            .filter(account::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_accounts(
        &self,
        user_id: i32,
        filter: &ListFilter,
    ) -> Result<ListPage<account::Model>, DataError> {
        let mut select =
            account::Entity::find().filter(account::Column::BelongsToUser.eq(user_id));
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(account::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, account::Column::Id, filter).await?)
    }

    async fn create_account(
        &self,
        input: &AccountCreationInput,
        user_id: i32,
    ) -> Result<account::Model, DataError> {
        let txn = self.connection().begin().await?;

        let created = account::ActiveModel {
            name: Set(input.name.clone()),
            plan_id: Set(input.plan_id),
            belongs_to_user: Set(user_id),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(ACCOUNT_RESOURCE, "created", created.id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_account(
        &self,
        updated: &account::Model,
        changes: Vec<FieldChangeSummary>,
    ) -> Result<account::Model, DataError> {
        let txn = self.connection().begin().await?;

        let saved = account::ActiveModel {
            id: Unchanged(updated.id),
            name: Set(updated.name.clone()),
            plan_id: Set(updated.plan_id),
            last_updated_on: Set(Some(OffsetDateTime::now_utc())),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(
                ACCOUNT_RESOURCE,
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

    async fn archive_account(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::ArchivedOn,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(account::Column::Id.eq(id))
            .filter(account::Column::BelongsToUser.eq(user_id))
            .filter(account::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(ACCOUNT_RESOURCE, "archived", id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_account(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), ACCOUNT_RESOURCE, id).await
    }
}
