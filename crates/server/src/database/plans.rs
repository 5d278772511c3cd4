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
use todo_types::plans::PlanCreationInput;

use super::audit_log::{self, AuditEvent, PLAN_RESOURCE};
use super::{DataError, ListPage, PlanDataManager, Querier, fetch_page};
use crate::entity::{audit_log_entry, plan};

/// Plans are global; every authenticated user may read them.
#[async_trait]
impl PlanDataManager for Querier {
    async fn get_plan(&self, id: i32) -> Result<plan::Model, DataError> {
        plan::Entity::find_by_id(id)
            .filter(plan::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_plans(&self, filter: &ListFilter) -> Result<ListPage<plan::Model>, DataError> {
        let mut select = plan::Entity::find();
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(plan::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, plan::Column::Id, filter).await?)
    }

    async fn create_plan(
        &self,
        input: &PlanCreationInput,
        performed_by: i32,
    ) -> Result<plan::Model, DataError> {
        let txn = self.connection().begin().await?;

        let created = plan::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price: Set(input.price),
            period: Set(input.period.clone()),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(PLAN_RESOURCE, "created", created.id, performed_by),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_plan(
        &self,
        updated: &plan::Model,
        changes: Vec<FieldChangeSummary>,
        performed_by: i32,
    ) -> Result<plan::Model, DataError> {
        let txn = self.connection().begin().await?;

        let saved = plan::ActiveModel {
            id: Unchanged(updated.id),
            name: Set(updated.name.clone()),
            description: Set(updated.description.clone()),
            price: Set(updated.price),
            period: Set(updated.period.clone()),
            last_updated_on: Set(Some(OffsetDateTime::now_utc())),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(PLAN_RESOURCE, "updated", updated.id, performed_by)
                .with_changes(&changes),
        )
        .await?;

        txn.commit().await?;
        Ok(saved)
    }

    async fn archive_plan(&self, id: i32, performed_by: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = plan::Entity::update_many()
            .col_expr(plan::Column::ArchivedOn, Expr::value(OffsetDateTime::now_utc()))
            .filter(plan::Column::Id.eq(id))
            .filter(plan::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(PLAN_RESOURCE, "archived", id, performed_by),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_plan(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), PLAN_RESOURCE, id).await
    }
}
