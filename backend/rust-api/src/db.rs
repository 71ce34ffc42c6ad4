use anyhow::{Context, Result};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

use crate::config::Config;

/// Connect to the LMS database named by `lms_db_url`.
///
/// The service never migrates: the LMS owns its schema.
pub async fn init_pool(config: &Config) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.lms_db_url)
        .await
        .with_context(|| format!("Failed to connect to LMS database for {}", config.app_name))?;

    Ok(pool)
}

pub async fn ping(pool: &AnyPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
