//! Clear products command
//!
//! Truncates the catalog and reports how many rows were removed.

use serde::Serialize;
use sqlx::PgPool;

use crate::db::PgProductStore;

#[derive(Debug, Clone, Serialize)]
pub struct ClearProductsResponse {
    pub deleted: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ClearProductsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> Result<ClearProductsResponse, ClearProductsError> {
    let store = PgProductStore::new(pool);
    let deleted = store.clear().await?;

    tracing::info!(deleted, "Product catalog cleared");

    Ok(ClearProductsResponse { deleted })
}
