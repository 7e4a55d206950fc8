//! Run the forum HTTP API

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use rosetta_server::db::{create_pool_from_config, migrations};
use rosetta_server::http::{run_server, ServerConfig};
use rosetta_server::{Models, RosettaConfig};

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config, default 127.0.0.1:4000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Apply schema migrations before serving
    #[arg(long)]
    pub migrate: bool,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = RosettaConfig::load().context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    tracing::info!(
        database = %config.database.redacted_url(),
        bind = %config.server.bind,
        "starting rosetta"
    );

    let pool = create_pool_from_config(&config.database)
        .await
        .context("failed to create database pool")?;

    if args.migrate {
        migrations::run(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let models = Models::new(pool, config.database.timeout());
    run_server(models, ServerConfig::from(&config.server))
        .await
        .context("server error")?;

    Ok(())
}
