//! List products query
//!
//! Returns a page of the catalog ordered by most recent write first, so a
//! fresh upload surfaces at the top of the listing.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{PgProductStore, ProductFilter, ProductRow};
use crate::features::shared::pagination::{PaginationMetadata, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListProductsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListProductsResponse {
    pub items: Vec<ProductRow>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListProductsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListProductsQuery {
    pub fn validate(&self) -> Result<(), ListProductsError> {
        self.pagination()
            .validate()
            .map_err(ListProductsError::InvalidPagination)
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}

#[tracing::instrument(skip(pool), fields(page = ?query.page, per_page = ?query.per_page))]
pub async fn handle(
    pool: PgPool,
    query: ListProductsQuery,
) -> Result<ListProductsResponse, ListProductsError> {
    query.validate()?;

    let pagination = query.pagination();
    let store = PgProductStore::new(pool);
    let total = store.count(&ProductFilter::default()).await?;
    let items = store
        .list_recent(pagination.per_page(), pagination.offset())
        .await?;

    Ok(ListProductsResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_defaults_pass() {
        let query = ListProductsQuery::default();
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_page() {
        let query = ListProductsQuery {
            page: Some(0),
            per_page: None,
        };
        assert!(matches!(
            query.validate(),
            Err(ListProductsError::InvalidPagination(_))
        ));
    }
}
