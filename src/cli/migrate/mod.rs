//! Migrate command - applies or reverts the PostgreSQL schema

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{
    revert_last_migration, run_storage_migrations, PostgresConfig,
};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,

    /// Database URL; falls back to `storage.database_url`, then `DATABASE_URL`
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);

    let url = database_url(&args, &config)
        .ok_or_else(|| anyhow::anyhow!("No database URL configured"))?;

    let pool = PostgresConfig::new(url)
        .with_max_connections(1)
        .connect()
        .await?;

    if args.revert {
        match revert_last_migration(&pool).await? {
            Some(version) => info!(version, "Migration reverted"),
            None => info!("No migrations to revert"),
        }
    } else {
        run_storage_migrations(&pool).await?;
        info!("Database schema is up to date");
    }

    pool.close().await;

    Ok(())
}

fn database_url(args: &MigrateArgs, config: &AppConfig) -> Option<String> {
    args.database_url
        .clone()
        .or_else(|| config.storage.database_url.clone())
        .or_else(|| std::env::var("DATABASE_URL").ok())
}
