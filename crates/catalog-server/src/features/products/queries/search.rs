//! Search products query
//!
//! Filters by exact brand and color plus an inclusive price range, ordered
//! cheapest first. Filter parsing is lenient: blank values and price bounds
//! that do not parse as numbers are ignored rather than rejected, so a
//! half-filled search form still returns results.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{PgProductStore, ProductFilter, ProductRow};
use crate::features::shared::pagination::{PaginationMetadata, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchProductsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "minPrice", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchProductsResponse {
    pub items: Vec<ProductRow>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchProductsError {
    #[error("{0}")]
    InvalidPagination(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SearchProductsQuery {
    pub fn validate(&self) -> Result<(), SearchProductsError> {
        self.pagination()
            .validate()
            .map_err(SearchProductsError::InvalidPagination)
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    /// Convert the raw query string values into store filters.
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            brand: non_blank(self.brand.as_deref()),
            color: non_blank(self.color.as_deref()),
            min_price: parse_price(self.min_price.as_deref()),
            max_price: parse_price(self.max_price.as_deref()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_price(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[tracing::instrument(skip(pool), fields(brand = ?query.brand, color = ?query.color))]
pub async fn handle(
    pool: PgPool,
    query: SearchProductsQuery,
) -> Result<SearchProductsResponse, SearchProductsError> {
    query.validate()?;

    let filter = query.filter();
    let pagination = query.pagination();
    let store = PgProductStore::new(pool);
    let total = store.count(&filter).await?;
    let items = store
        .search(&filter, pagination.per_page(), pagination.offset())
        .await?;

    Ok(SearchProductsResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_trims_and_drops_blanks() {
        let query = SearchProductsQuery {
            brand: Some("  StreamThreads  ".to_string()),
            color: Some("   ".to_string()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.brand.as_deref(), Some("StreamThreads"));
        assert!(filter.color.is_none());
    }

    #[test]
    fn test_filter_ignores_unparseable_prices() {
        let query = SearchProductsQuery {
            min_price: Some("100".to_string()),
            max_price: Some("abc".to_string()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.min_price, Some(100.0));
        assert!(filter.max_price.is_none());
    }

    #[test]
    fn test_query_params_deserialize_camel_case() {
        let query: SearchProductsQuery =
            serde_json::from_str(r#"{"brand":"Acme","minPrice":"10","maxPrice":"99.5"}"#)
                .unwrap();
        assert_eq!(query.brand.as_deref(), Some("Acme"));
        assert_eq!(query.filter().max_price, Some(99.5));
    }

    #[test]
    fn test_validation_rejects_oversized_page() {
        let query = SearchProductsQuery {
            per_page: Some(500),
            ..Default::default()
        };
        assert!(matches!(
            query.validate(),
            Err(SearchProductsError::InvalidPagination(_))
        ));
    }
}
