//! Streaming CSV ingestion pipeline
//!
//! The ingestion core consumes a CSV byte source incrementally, batches
//! well-formed rows, validates each row against the product business rules,
//! deduplicates by SKU within the run, and hands fixed-size batches to a
//! [`ProductSink`] for bulk upsert. Parsing never outruns persistence: the
//! parser suspends on a bounded channel while a batch is in flight, so
//! in-flight memory stays at `O(batch_size)` records.
//!
//! Data flow:
//!
//! ```text
//! byte source -> parser -> RawRecord batches -> pipeline -> validator
//!                                   |                          |
//!                                   v                          v
//!                            bounded channel        valid rows -> sink batches
//!                                                 invalid rows -> failure report
//! ```
//!
//! Row-level validation errors are data: they are collected into the
//! [`IngestionSummary`] and never abort a run. Structural CSV errors and
//! sink failures are control flow: they unwind the run as [`IngestError`].

pub mod models;
pub mod parser;
pub mod pipeline;
pub mod validator;

use thiserror::Error;

pub use models::{IngestionSummary, PartialProduct, RawRecord, RowFailure, RowValidation, ValidatedProduct};
pub use parser::{parse_csv_str, parse_csv_stream, CsvBatchStream};
pub use pipeline::{IngestionPipeline, ProductSink};
pub use validator::validate_row;

/// Fatal ingestion failures
///
/// Distinct from per-row validation errors, which are collected in the
/// [`IngestionSummary`] rather than raised.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed CSV framing (ragged rows, broken quoting, invalid UTF-8).
    /// Aborts the run before the remaining rows are seen.
    #[error("malformed CSV input: {0}")]
    Parse(#[from] csv_async::Error),

    /// A batch handler passed to [`parse_csv_stream`] failed.
    #[error("batch handler failed: {0}")]
    Batch(#[source] anyhow::Error),

    /// The sink rejected a batch. Batches committed before the failure stay
    /// committed; `stored` reports how many rows they contained.
    #[error("bulk upsert failed after {stored} rows were stored: {source}")]
    Sink {
        stored: u64,
        #[source]
        source: anyhow::Error,
    },
}
