use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use time::OffsetDateTime;
use todo_types::QueryFilter as ListFilter;

use super::audit_log::{self, AuditEvent, OAUTH2_CLIENT_RESOURCE};
use super::{DataError, ListPage, NewOAuth2Client, OAuth2ClientDataManager, Querier, fetch_page};
use crate::entity::{audit_log_entry, join_list, oauth2_client};

#[async_trait]
impl OAuth2ClientDataManager for Querier {
    async fn get_oauth2_client(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<oauth2_client::Model, DataError> {
        oauth2_client::Entity::find_by_id(id)
            .filter(oauth2_client::Column::BelongsToUser.eq(user_id))
            .filter(oauth2_client::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_oauth2_client_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<oauth2_client::Model, DataError> {
        oauth2_client::Entity::find()
            .filter(oauth2_client::Column::ClientId.eq(client_id))
            .filter(oauth2_client::Column::ArchivedOn.is_null())
            .one(self.connection())
            .await?
            .ok_or(DataError::NotFound)
    }

    async fn get_oauth2_clients(
        &self,
        user_id: i32,
        filter: &ListFilter,
    ) -> Result<ListPage<oauth2_client::Model>, DataError> {
        let mut select = oauth2_client::Entity::find()
            .filter(oauth2_client::Column::BelongsToUser.eq(user_id));
        if !filter.include_archived.unwrap_or(false) {
            select = select.filter(oauth2_client::Column::ArchivedOn.is_null());
        }
        Ok(fetch_page(self.connection(), select, oauth2_client::Column::Id, filter).await?)
    }

    async fn create_oauth2_client(
        &self,
        input: NewOAuth2Client,
    ) -> Result<oauth2_client::Model, DataError> {
        let txn = self.connection().begin().await?;
        let owner = input.belongs_to_user;

        let created = oauth2_client::ActiveModel {
            name: Set(input.name),
            client_id: Set(input.client_id),
            client_secret: Set(input.client_secret),
            redirect_uri: Set(input.redirect_uri),
            scopes: Set(join_list(&input.scopes)),
            implicit_allowed: Set(input.implicit_allowed),
            belongs_to_user: Set(owner),
            created_on: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        audit_log::record(
            &txn,
            AuditEvent::new(OAUTH2_CLIENT_RESOURCE, "created", created.id, owner)
                .with_context("client_id", created.client_id.clone()),
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    async fn archive_oauth2_client(&self, id: i32, user_id: i32) -> Result<(), DataError> {
        let txn = self.connection().begin().await?;

        let result = oauth2_client::Entity::update_many()
            .col_expr(
                oauth2_client::Column::ArchivedOn,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(oauth2_client::Column::Id.eq(id))
            .filter(oauth2_client::Column::BelongsToUser.eq(user_id))
            .filter(oauth2_client::Column::ArchivedOn.is_null())
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::NotFound);
        }

        audit_log::record(
            &txn,
            AuditEvent::new(OAUTH2_CLIENT_RESOURCE, "archived", id, user_id),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn get_audit_log_entries_for_oauth2_client(
        &self,
        id: i32,
    ) -> Result<Vec<audit_log_entry::Model>, DataError> {
        audit_log::entries_for(self.connection(), OAUTH2_CLIENT_RESOURCE, id).await
    }
}
