//! Catalog Server Library
//!
//! HTTP server for bulk product catalog ingestion.
//!
//! # Overview
//!
//! The catalog server ingests large CSV product feeds and serves the stored
//! catalog back over a small REST API:
//!
//! - **CSV Ingestion**: Streaming, bounded-memory parsing with per-row
//!   validation and batched upserts
//! - **Database Management**: PostgreSQL integration with SQLx
//! - **Configuration**: Environment-based configuration management
//! - **Middleware**: CORS, request logging and response compression
//!
//! # Architecture
//!
//! Features are vertical slices under [`features`], split into commands
//! (writes) and queries (reads):
//!
//! - **Commands**: CSV upload ingestion, catalog clearing
//! - **Queries**: Paginated listing, filtered search
//!
//! The ingestion core lives in [`ingest`] and is independent of HTTP: the
//! parser streams records through a bounded channel, the validator checks
//! every row against the catalog schema, and the pipeline deduplicates and
//! batches validated rows into a [`ingest::ProductSink`]. The production
//! sink is the PostgreSQL store in [`db`].
//!
//! ## Framework Stack
//!
//! - **Axum**: Modern, ergonomic web framework
//! - **SQLx**: PostgreSQL driver and migrations
//! - **Tower-HTTP**: trace, CORS and compression middleware

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;

pub use config::Config;
