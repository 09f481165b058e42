use std::sync::Arc;

use anyhow::Context;
use sqlx::MySqlPool;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::store::Stores;
use crate::store::memory::MemoryStore;

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Opens whichever backend the configuration selects.
pub async fn init_stores(config: &Config) -> anyhow::Result<Stores> {
    match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::MySql, Some(url)) => {
            let pool = init_db(url).await?;
            info!("Using MySQL storage");
            Ok(Stores::mysql(pool))
        }
        (StorageBackend::MySql, None) => anyhow::bail!("DATABASE_URL must be set for MySQL storage"),
        (StorageBackend::Memory, _) => {
            info!("Using in-memory storage, data is lost on restart");
            Ok(Stores::memory(Arc::new(MemoryStore::new())))
        }
    }
}
