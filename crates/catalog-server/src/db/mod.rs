//! Database access layer
//!
//! PostgreSQL connection pooling plus the product store. Schema changes
//! live in the workspace `migrations/` directory and are embedded via
//! `sqlx::migrate!` at startup.

pub mod products;

pub use products::{PgProductStore, ProductFilter, ProductRow};

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Build the shared connection pool from configuration
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
}
