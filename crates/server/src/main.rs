use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use todo_server::api::{build_router, serve};
use todo_server::config::load_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "todo_server=info,tower_http=info,hyper=warn,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    initialize_tracing();

    let config = load_config()?;

    let db = Arc::new(Database::connect(&config.database_url).await?);
    if config.run_migrations {
        Migrator::up(db.as_ref(), None).await?;
        tracing::info!("migrations applied");
    }

    let router = build_router(db, &config);
    serve(router, &config).await
}
