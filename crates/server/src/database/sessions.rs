use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, TransactionTrait};
use time::OffsetDateTime;

use super::audit_log::{self, AuditEvent, USER_RESOURCE};
use super::{DataError, Querier, SessionDataManager};
use crate::entity::session;
use crate::random::random_token;

#[async_trait]
impl SessionDataManager for Querier {
    async fn create_session(
        &self,
        user_id: i32,
        lifetime: time::Duration,
    ) -> Result<session::Model, DataError> {
        let now = OffsetDateTime::now_utc();
        let txn = self.connection().begin().await?;

        let created = session::ActiveModel {
            token: Set(random_token()),
            user_id: Set(user_id),
            expires_at: Set(now + lifetime),
            created_on: Set(now),
        }
        .insert(&txn)
        .await?;
        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "logged_in", user_id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    /// Expired sessions are removed on lookup and reported as missing.
    async fn get_session(&self, token: &str) -> Result<session::Model, DataError> {
        let found = session::Entity::find_by_id(token.to_string())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)?;

        if found.is_expired() {
            session::Entity::delete_by_id(token.to_string())
                .exec(self.connection())
                .await?;
            return Err(DataError::NotFound);
        }
        Ok(found)
    }

    async fn delete_session(&self, token: &str) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let found = session::Entity::find_by_id(token.to_string())
            .one(&txn)
            .await?
            .ok_or(DataError::NotFound)?;
        session::Entity::delete_by_id(token.to_string())
            .exec(&txn)
            .await?;
        audit_log::record(
            &txn,
            AuditEvent::new(USER_RESOURCE, "logged_out", found.user_id, found.user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }
}
