use anyhow::Context;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::PgStore;

pub async fn handle(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL is not set; nothing to migrate");
    }

    let store = PgStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("failed to apply migrations")?;

    output_success(
        &output_format,
        "Migrations applied",
        Some(json!({ "environment": format!("{:?}", config.environment).to_lowercase() })),
    )
}
