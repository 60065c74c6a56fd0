//! Migration CLI tool.
//!
//! Applies the blog collections outside the server, which otherwise runs
//! them on first use. Reads `DATABASE_URL`; `DATABASE_SCHEMA` selects the
//! schema (the server derives it from `AZURE_COSMOS_DATABASE_NAME`).

use sea_orm_migration::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    cli::run_cli(globe_infra::Migrator).await;
}
