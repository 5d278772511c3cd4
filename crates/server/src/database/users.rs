use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
    sea_query::{Expr, Func},
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;
use todo_types::users::AccountStatus;

use super::audit_log::{self, AuditEvent, USER_RESOURCE};
use super::{DataError, ListPage, NewUser, Querier, UserDataManager, fetch_page};
use crate::entity::{audit_log_entry, user};

impl Querier {
    async fn find_active_user(&self, user_id: i32) -> Result<user::Model, DataError> {
        user::Entity::find_by_id(user_id)
            .filter(user::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }
}

#[async_trait]
impl UserDataManager for Querier {
    async fn get_user(&self, user_id: i32) -> Result<user::Model, DataError> {
        self.find_active_user(user_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<user::Model, DataError> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn search_users_by_username(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<user::Model>, DataError> {
        let pattern = format!("%{}%", query.to_lowercase());
        Ok(user::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(user::Column::Username))).like(pattern))
            .filter(user::Column::ArchivedOn.is_null())
            .limit(limit)
            .all(self.connection())
            .await?)
    }

    async fn get_users(&self, filter: &ListFilter) -> Result<ListPage<user::Model>, DataError> {
        let mut select = user::Entity::find();
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(user::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, user::Column::Id, filter).await?)
    }

    async fn create_user(&self, input: NewUser) -> Result<user::Model, DataError> {
        let txn = self.connection().begin().await?;

        let created = user::ActiveModel {
            username: Set(input.username),
            hashed_password: Set(input.hashed_password),
            password_last_changed_on: Set(None),
            requires_password_change: Set(false),
            two_factor_secret: Set(input.two_factor_secret),
            two_factor_secret_verified_on: Set(None),
            is_admin: Set(false),
            account_status: Set(AccountStatus::Unverified.as_str().to_string()),
            account_status_explanation: Set(None),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "created", created.id, created.id),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_user_password(
        &self,
        user_id: i32,
        hashed_password: &str,
    ) -> Result<(), DataError> {
        let existing = self.find_active_user(user_id).await?;
        let txn = self.connection().begin().await?;
        let now = OffsetDateTime::now_utc();

        let mut active: user::ActiveModel = existing.into();
        active.hashed_password = Set(hashed_password.to_string());
        active.password_last_changed_on = Set(Some(now));
        active.requires_password_change = Set(false);
        active.last_updated_on = Set(Some(now));
        active.update(&txn).await?;

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "password_updated", user_id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn update_two_factor_secret(
        &self,
        user_id: i32,
        secret: &str,
    ) -> Result<(), DataError> {
        let existing = self.find_active_user(user_id).await?;
        let txn = self.connection().begin().await?;

        let mut active: user::ActiveModel = existing.into();
        active.two_factor_secret = Set(secret.to_string());
        active.two_factor_secret_verified_on = Set(None);
        active.last_updated_on = Set(Some(OffsetDateTime::now_utc()));
        active.update(&txn).await?;

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "two_factor_secret_changed", user_id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn mark_two_factor_secret_verified(&self, user_id: i32) -> Result<(), DataError> {
        let existing = self.find_active_user(user_id).await?;
        let txn = self.connection().begin().await?;
        let now = OffsetDateTime::now_utc();

        let previously_unverified = existing.status() == AccountStatus::Unverified;
        let mut active: user::ActiveModel = existing.into();
        active.two_factor_secret_verified_on = Set(Some(now));
        if previously_unverified {
            active.account_status = Set(AccountStatus::Good.as_str().to_string());
        }
        active.last_updated_on = Set(Some(now));
        active.update(&txn).await?;

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "two_factor_secret_verified", user_id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn update_user_reputation(
        &self,
        user_id: i32,
        status: AccountStatus,
        reason: &str,
        performed_by: i32,
    ) -> Result<(), DataError> {
        let existing = self.find_active_user(user_id).await?;
        let txn = self.connection().begin().await?;

        let previous = existing.account_status.clone();
        let mut active: user::ActiveModel = existing.into();
        active.account_status = Set(status.as_str().to_string());
        active.account_status_explanation = Set(Some(reason.to_string()));
        active.last_updated_on = Set(Some(OffsetDateTime::now_utc()));
        active.update(&txn).await?;

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "reputation_changed", user_id, performed_by)
                .with_context("previous_status", previous)
                .with_context("new_status", status.as_str())
                .with_context("reason", reason),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn archive_user(&self, user_id: i32, performed_by: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = user::Entity::update_many()
            .col_expr(
                user::Column::ArchivedOn,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "archived", user_id, performed_by),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), USER_RESOURCE, user_id).await
    }
}
