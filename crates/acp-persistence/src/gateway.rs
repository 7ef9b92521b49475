use acp_types::AcpResult;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::err::MapStoreErr;

/// connects to the configured store and ensures schema exists. idempotent —
/// safe to call on every process start, mirroring the teacher binaries'
/// `sled::open` / table-creation-at-startup pattern.
#[derive(Clone)]
pub struct Gateway {
    pub(crate) pool: SqlitePool,
}

impl Gateway {
    pub async fn connect(database_url: &str) -> AcpResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .store_err()?;

        sqlx::migrate!("./migrations").run(&pool).await.store_err()?;

        info!(database_url, "persistence gateway: schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
