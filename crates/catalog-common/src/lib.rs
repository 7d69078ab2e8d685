//! Catalog Common Library
//!
//! Shared error handling and logging for the catalog workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`CatalogError`] type and [`Result`] alias
//! - **Logging**: centralized tracing initialization used by every binary
//!
//! # Example
//!
//! ```no_run
//! use catalog_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> catalog_common::Result<()> {
//!     let config = LogConfig::from_env();
//!     init_logging(&config)?;
//!     tracing::info!("started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CatalogError, Result};
