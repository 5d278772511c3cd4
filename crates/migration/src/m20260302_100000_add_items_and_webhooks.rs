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
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Details).text().not_null().default(""))
                    .col(ColumnDef::new(Items::BelongsToUser).integer().not_null())
                    .col(
                        ColumnDef::new(Items::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Items::LastUpdatedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Items::ArchivedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_user")
                            .from(Items::Table, Items::BelongsToUser)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_items_belongs_to_user")
                    .table(Items::Table)
                    .col(Items::BelongsToUser)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Webhooks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Webhooks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Webhooks::Name).string().not_null())
                    .col(ColumnDef::new(Webhooks::ContentType).string().not_null())
                    .col(ColumnDef::new(Webhooks::Url).string().not_null())
                    .col(ColumnDef::new(Webhooks::Method).string().not_null())
                    .col(ColumnDef::new(Webhooks::Events).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Webhooks::DataTypes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Webhooks::Topics).text().not_null().default(""))
                    .col(ColumnDef::new(Webhooks::BelongsToUser).integer().not_null())
                    .col(
                        ColumnDef::new(Webhooks::CreatedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Webhooks::LastUpdatedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Webhooks::ArchivedOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_webhooks_user")
                            .from(Webhooks::Table, Webhooks::BelongsToUser)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Webhooks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    Name,
    Details,
    BelongsToUser,
    CreatedOn,
    LastUpdatedOn,
    ArchivedOn,
}

#[derive(DeriveIden)]
enum Webhooks {
    Table,
    Id,
    Name,
    ContentType,
    Url,
    Method,
    Events,
    DataTypes,
    Topics,
    BelongsToUser,
    CreatedOn,
    LastUpdatedOn,
    ArchivedOn,
}
