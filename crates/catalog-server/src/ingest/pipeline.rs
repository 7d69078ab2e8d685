//! Ingestion orchestration
//!
//! Drives the streaming parser, routes every record through the validator,
//! deduplicates by SKU within the run, and submits batches of validated
//! rows to the injected [`ProductSink`]. Rows are processed strictly in
//! input order; no validation overlaps a sink call.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::debug;

use super::models::{IngestionSummary, RowFailure, ValidatedProduct};
use super::parser::CsvBatchStream;
use super::validator::validate_row;
use super::IngestError;

/// Records pulled from the parser per channel batch
pub const DEFAULT_PARSE_BATCH_SIZE: usize = 500;

/// Validated rows grouped per bulk upsert
pub const DEFAULT_SINK_BATCH_SIZE: usize = 1000;

/// Persistence collaborator for validated product batches
///
/// Implementations perform an insert-or-update keyed by `sku` and return
/// the number of rows applied. A batch either fully succeeds or fails as a
/// whole; the pipeline never retries and never rolls back earlier batches.
#[async_trait]
pub trait ProductSink: Send + Sync {
    async fn upsert_batch(&self, rows: &[ValidatedProduct]) -> anyhow::Result<u64>;
}

/// One ingestion run over a CSV source
///
/// The parser chunk size and the sink batch size are independent: the
/// orchestrator re-batches validated rows so that persistence overhead is
/// amortized regardless of how the parser chunks the input.
pub struct IngestionPipeline<'a, S> {
    sink: &'a S,
    parse_batch_size: usize,
    sink_batch_size: usize,
}

impl<'a, S: ProductSink> IngestionPipeline<'a, S> {
    pub fn new(sink: &'a S) -> Self {
        Self {
            sink,
            parse_batch_size: DEFAULT_PARSE_BATCH_SIZE,
            sink_batch_size: DEFAULT_SINK_BATCH_SIZE,
        }
    }

    /// Override the parser chunk size and the sink batch size
    ///
    /// # Panics
    ///
    /// Panics if either size is zero.
    pub fn with_batch_sizes(mut self, parse_batch_size: usize, sink_batch_size: usize) -> Self {
        assert!(parse_batch_size > 0 && sink_batch_size > 0, "batch sizes must be positive");
        self.parse_batch_size = parse_batch_size;
        self.sink_batch_size = sink_batch_size;
        self
    }

    /// Ingest the CSV source and return the run summary
    ///
    /// Invalid rows are collected, never fatal. Duplicate SKUs within the
    /// run are silently dropped after the first occurrence. A structural
    /// CSV error or a sink failure aborts the remainder of the run;
    /// previously submitted batches stay committed.
    #[tracing::instrument(skip(self, reader))]
    pub async fn run<R>(&self, reader: R) -> Result<IngestionSummary, IngestError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut stream = CsvBatchStream::new(reader, self.parse_batch_size);
        let mut summary = IngestionSummary::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<ValidatedProduct> = Vec::with_capacity(self.sink_batch_size);
        let mut row: u64 = 0;

        while let Some(batch) = stream.next_batch().await? {
            for raw in batch {
                row += 1;
                let outcome = validate_row(&raw);
                if !outcome.valid {
                    summary.failed.push(RowFailure {
                        row,
                        errors: outcome.errors,
                        raw,
                    });
                    continue;
                }
                let Some(product) = outcome.into_product() else {
                    continue;
                };
                // First occurrence wins; later duplicates in the same
                // upload are dropped without being reported as failures.
                if !seen.insert(product.sku.clone()) {
                    continue;
                }
                pending.push(product);
                if pending.len() >= self.sink_batch_size {
                    self.submit(&mut pending, &mut summary).await?;
                }
            }
        }

        if !pending.is_empty() {
            self.submit(&mut pending, &mut summary).await?;
        }

        debug!(
            stored = summary.stored,
            failed = summary.failed.len(),
            rows = row,
            "ingestion run finished"
        );
        Ok(summary)
    }

    async fn submit(
        &self,
        pending: &mut Vec<ValidatedProduct>,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        let applied = self
            .sink
            .upsert_batch(pending)
            .await
            .map_err(|source| IngestError::Sink {
                stored: summary.stored,
                source,
            })?;
        debug!(batch = pending.len(), applied, "batch submitted to sink");
        summary.stored += pending.len() as u64;
        pending.clear();
        Ok(())
    }
}
