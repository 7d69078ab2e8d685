//! Upload products command
//!
//! Runs the streaming CSV ingestion pipeline against the uploaded file and
//! reports what was stored, which rows failed validation and why, plus a
//! small sample of the most recently written products.

use serde::Serialize;
use sqlx::PgPool;
use tokio::io::AsyncRead;

use crate::db::{PgProductStore, ProductRow};
use crate::ingest::{IngestError, IngestionPipeline, RowFailure};

/// Rows returned in the post-upload sample
const SAMPLE_SIZE: i64 = 20;

#[derive(Debug, Serialize)]
pub struct UploadProductsResponse {
    /// Rows submitted to the store (inserts and updates alike)
    pub stored: u64,
    /// Per-row validation failures, in input order
    pub failed: Vec<RowFailure>,
    /// Sample of the most recently written products
    pub items: Vec<ProductRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadProductsError {
    #[error("file field is required")]
    MissingFile,
    #[error("invalid multipart payload: {0}")]
    Multipart(String),
    #[error("malformed CSV: {0}")]
    Csv(#[source] csv_async::Error),
    #[error("ingestion failed after {stored} rows were stored")]
    Ingest {
        stored: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, reader))]
pub async fn handle<R>(pool: PgPool, reader: R) -> Result<UploadProductsResponse, UploadProductsError>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let store = PgProductStore::new(pool);
    let pipeline = IngestionPipeline::new(&store);

    let summary = pipeline.run(reader).await.map_err(|err| match err {
        IngestError::Parse(source) => UploadProductsError::Csv(source),
        IngestError::Batch(source) => UploadProductsError::Ingest { stored: 0, source },
        IngestError::Sink { stored, source } => UploadProductsError::Ingest { stored, source },
    })?;

    tracing::info!(
        stored = summary.stored,
        failed = summary.failed.len(),
        "CSV upload ingested"
    );

    let items = store.sample_recent(SAMPLE_SIZE).await?;

    Ok(UploadProductsResponse {
        stored: summary.stored,
        failed: summary.failed,
        items,
    })
}
