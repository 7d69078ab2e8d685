//! Feature modules organized as vertical slices
//!
//! Each feature owns its commands (writes), queries (reads) and routes.

pub mod products;
pub mod shared;

use axum::Router;
use sqlx::PgPool;

/// Build the application router.
///
/// Routes are served both at the root and under `/api` so existing
/// clients of either prefix keep working.
pub fn api_router() -> Router<PgPool> {
    let products = products::routes::products_routes();
    Router::new().merge(products.clone()).nest("/api", products)
}
