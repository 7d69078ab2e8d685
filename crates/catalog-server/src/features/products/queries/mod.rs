//! Read operations for the product catalog

pub mod list;
pub mod search;

pub use list::{ListProductsError, ListProductsQuery, ListProductsResponse};
pub use search::{SearchProductsError, SearchProductsQuery, SearchProductsResponse};
