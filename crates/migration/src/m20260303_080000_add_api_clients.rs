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
                    .table(ApiClients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiClients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApiClients::Name).string().not_null())
                    .col(
                        ColumnDef::new(ApiClients::ClientId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ApiClients::SecretKey).string().not_null())
                    .col(
                        ColumnDef::new(ApiClients::BelongsToUser)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiClients::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiClients::LastUpdatedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ApiClients::ArchivedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_clients_user")
                            .from(ApiClients::Table, ApiClients::BelongsToUser)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiClients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiClients {
    Table,
    Id,
    Name,
    ClientId,
    SecretKey,
    BelongsToUser,
    CreatedOn,
    LastUpdatedOn,
    ArchivedOn,
}
