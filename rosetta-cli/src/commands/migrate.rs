//! Apply the forum schema to the configured database

use anyhow::{Context, Result};
use clap::Parser;

use rosetta_server::db::{create_pool_from_config, migrations};
use rosetta_server::RosettaConfig;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let mut config = RosettaConfig::load().context("failed to load configuration")?;
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    let pool = create_pool_from_config(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.redacted_url()))?;

    migrations::run(&pool)
        .await
        .context("failed to apply migrations")?;

    println!("Migrations applied to {}", config.database.redacted_url());
    Ok(())
}
