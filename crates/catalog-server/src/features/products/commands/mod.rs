//! Write operations for the product catalog

pub mod clear;
pub mod upload;

pub use clear::{ClearProductsError, ClearProductsResponse};
pub use upload::{UploadProductsError, UploadProductsResponse};
