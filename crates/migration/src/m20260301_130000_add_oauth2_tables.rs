//! OAuth2 client registrations and the tokens issued to them.
//!
//! - oauth2_clients: machine identities owned by a user
//! - oauth2_tokens: bearer tokens issued by the token endpoint

use sea_orm_migration::prelude::*;

use crate::m20260301_120000_create_users_and_sessions::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OAuth2Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OAuth2Clients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OAuth2Clients::Name).string().not_null())
                    .col(
                        ColumnDef::new(OAuth2Clients::ClientId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::ClientSecret)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::RedirectUri)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::Scopes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::ImplicitAllowed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::BelongsToUser)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::LastUpdatedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Clients::ArchivedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_oauth2_clients_user")
                            .from(OAuth2Clients::Table, OAuth2Clients::BelongsToUser)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OAuth2Tokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OAuth2Tokens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Tokens::AccessToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Tokens::TokenType)
                            .string()
                            .not_null()
                            .default("Bearer"),
                    )
                    .col(ColumnDef::new(OAuth2Tokens::ClientId).string().not_null())
                    .col(ColumnDef::new(OAuth2Tokens::UserId).string().not_null())
                    .col(
                        ColumnDef::new(OAuth2Tokens::Scope)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OAuth2Tokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Tokens::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OAuth2Tokens::RevokedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_oauth2_tokens_client_id")
                    .table(OAuth2Tokens::Table)
                    .col(OAuth2Tokens::ClientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OAuth2Tokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OAuth2Clients::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum OAuth2Clients {
    #[sea_orm(iden = "oauth2_clients")]
    Table,
    Id,
    Name,
    ClientId,
    ClientSecret,
    RedirectUri,
    Scopes,
    ImplicitAllowed,
    BelongsToUser,
    CreatedOn,
    LastUpdatedOn,
    ArchivedOn,
}

#[derive(DeriveIden)]
enum OAuth2Tokens {
    #[sea_orm(iden = "oauth2_tokens")]
    Table,
    Id,
    AccessToken,
    TokenType,
    ClientId,
    UserId,
    Scope,
    ExpiresAt,
    CreatedOn,
    RevokedAt,
}
