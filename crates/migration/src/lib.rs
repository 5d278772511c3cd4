pub use sea_orm_migration::prelude::*;

mod m20260301_120000_create_users_and_sessions;
mod m20260301_130000_add_oauth2_tables;
mod m20260302_090000_add_plans_and_accounts;
mod m20260302_100000_add_items_and_webhooks;
mod m20260303_080000_add_api_clients;
mod m20260303_090000_add_audit_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_120000_create_users_and_sessions::Migration),
            Box::new(m20260301_130000_add_oauth2_tables::Migration),
            Box::new(m20260302_090000_add_plans_and_accounts::Migration),
            Box::new(m20260302_100000_add_items_and_webhooks::Migration),
            Box::new(m20260303_080000_add_api_clients::Migration),
            Box::new(m20260303_090000_add_audit_log::Migration),
        ]
    }
}
