//! Product API routes
//!
//! Wires the product commands and queries to Axum HTTP handlers.
//!
//! # Route Structure
//!
//! - `POST /upload` - Ingest a CSV catalog file (multipart, field `file`)
//! - `GET /products` - List products with pagination, newest first
//! - `GET /products/search` - Filtered search ordered by price
//! - `DELETE /products` - Remove every product

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tokio::io::AsyncWriteExt;

use crate::api::response::{ApiResponse, ErrorResponse};

use super::{
    commands::{ClearProductsError, UploadProductsError},
    queries::{
        ListProductsError, ListProductsQuery, SearchProductsError, SearchProductsQuery,
    },
};

/// Maximum accepted upload size in bytes
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Creates the products router with all routes configured
pub fn products_routes() -> Router<PgPool> {
    Router::new()
        .route(
            "/upload",
            post(upload_products).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/products", get(list_products).delete(clear_products))
        .route("/products/search", get(search_products))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Ingest a CSV catalog file
///
/// # Endpoint
///
/// `POST /upload` with a multipart body carrying the CSV under the `file`
/// field. The upload is spooled to a temp file so that arbitrarily large
/// catalogs never sit in memory whole.
///
/// # Response
///
/// - `200 OK` - Ingestion ran; body reports stored count and per-row failures
/// - `400 Bad Request` - Missing `file` field or structurally malformed CSV
/// - `500 Internal Server Error` - Database error mid-run
#[tracing::instrument(skip(pool, multipart))]
async fn upload_products(
    State(pool): State<PgPool>,
    mut multipart: Multipart,
) -> Result<Response, ProductsApiError> {
    let spooled = spool_csv_field(&mut multipart).await?;
    let tmp = spooled.ok_or(UploadProductsError::MissingFile)?;

    let reader = tokio::fs::File::from_std(tmp.reopen().map_err(UploadProductsError::Io)?);
    let response = super::commands::upload::handle(pool, reader).await?;

    tracing::info!(
        stored = response.stored,
        failed = response.failed.len(),
        "CSV uploaded via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Copy the `file` multipart field into a temp file.
///
/// Returns `None` when the field is absent. The temp file is deleted when
/// the returned handle drops.
async fn spool_csv_field(
    multipart: &mut Multipart,
) -> Result<Option<tempfile::NamedTempFile>, UploadProductsError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let tmp = tempfile::NamedTempFile::new()?;
        let mut writer = tokio::fs::File::from_std(tmp.reopen()?);
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;
        return Ok(Some(tmp));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> UploadProductsError {
    UploadProductsError::Multipart(err.to_string())
}

/// Remove every product
///
/// # Endpoint
///
/// `DELETE /products`
///
/// # Response
///
/// - `200 OK` - Catalog cleared; body reports how many rows were removed
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool))]
async fn clear_products(State(pool): State<PgPool>) -> Result<Response, ProductsApiError> {
    let response = super::commands::clear::handle(pool).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// List products with pagination
///
/// # Endpoint
///
/// `GET /products?page=1&per_page=20`
///
/// # Response
///
/// - `200 OK` - Page of products, most recently written first
/// - `400 Bad Request` - Invalid pagination parameters
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool, query))]
async fn list_products(
    State(pool): State<PgPool>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Response, ProductsApiError> {
    let response = super::queries::list::handle(pool, query).await?;

    let meta = json!({ "pagination": response.pagination });
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_meta(response.items, meta)),
    )
        .into_response())
}

/// Search products by brand, color and price range
///
/// # Endpoint
///
/// `GET /products/search?brand=StreamThreads&color=Red&minPrice=100&maxPrice=1000&page=1&per_page=20`
///
/// Blank filters and non-numeric price bounds are ignored.
///
/// # Response
///
/// - `200 OK` - Matching products ordered by price ascending
/// - `400 Bad Request` - Invalid pagination parameters
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool, query))]
async fn search_products(
    State(pool): State<PgPool>,
    Query(query): Query<SearchProductsQuery>,
) -> Result<Response, ProductsApiError> {
    let response = super::queries::search::handle(pool, query).await?;

    let meta = json!({ "pagination": response.pagination });
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_meta(response.items, meta)),
    )
        .into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for product API endpoints
#[derive(Debug)]
enum ProductsApiError {
    Upload(UploadProductsError),
    Clear(ClearProductsError),
    List(ListProductsError),
    Search(SearchProductsError),
}

impl From<UploadProductsError> for ProductsApiError {
    fn from(err: UploadProductsError) -> Self {
        Self::Upload(err)
    }
}

impl From<ClearProductsError> for ProductsApiError {
    fn from(err: ClearProductsError) -> Self {
        Self::Clear(err)
    }
}

impl From<ListProductsError> for ProductsApiError {
    fn from(err: ListProductsError) -> Self {
        Self::List(err)
    }
}

impl From<SearchProductsError> for ProductsApiError {
    fn from(err: SearchProductsError) -> Self {
        Self::Search(err)
    }
}

impl IntoResponse for ProductsApiError {
    fn into_response(self) -> Response {
        match self {
            // Upload errors
            ProductsApiError::Upload(UploadProductsError::MissingFile)
            | ProductsApiError::Upload(UploadProductsError::Multipart(_))
            | ProductsApiError::Upload(UploadProductsError::Csv(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            ProductsApiError::Upload(UploadProductsError::Ingest { stored, .. }) => {
                tracing::error!(stored, "Ingestion aborted mid-run: {}", self);
                let error = ErrorResponse::with_details(
                    "INTERNAL_ERROR",
                    "Ingestion failed",
                    json!({ "stored": stored }),
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            ProductsApiError::Upload(UploadProductsError::Io(_))
            | ProductsApiError::Upload(UploadProductsError::Database(_)) => {
                tracing::error!("Upload failed: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Clear errors
            ProductsApiError::Clear(ClearProductsError::Database(_)) => {
                tracing::error!("Database error while clearing products: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // List errors
            ProductsApiError::List(ListProductsError::InvalidPagination(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            ProductsApiError::List(ListProductsError::Database(_)) => {
                tracing::error!("Database error while listing products: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Search errors
            ProductsApiError::Search(SearchProductsError::InvalidPagination(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            ProductsApiError::Search(SearchProductsError::Database(_)) => {
                tracing::error!("Database error while searching products: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for ProductsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload(e) => write!(f, "{}", e),
            Self::Clear(e) => write!(f, "{}", e),
            Self::List(e) => write!(f, "{}", e),
            Self::Search(e) => write!(f, "{}", e),
        }
    }
}
