//! Product store
//!
//! Bulk upsert plus the read paths behind the listing and search
//! endpoints. The store is the production [`ProductSink`]: the ingestion
//! pipeline submits validated batches here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::ingest::{ProductSink, ValidatedProduct};

/// A persisted product row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductRow {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub mrp: f64,
    pub price: f64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for product search
///
/// Absent fields leave the corresponding predicate out entirely.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Exact brand match
    pub brand: Option<String>,
    /// Exact color match
    pub color: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
}

const PRODUCT_COLUMNS: &str =
    "sku, name, brand, color, size, mrp, price, quantity, created_at, updated_at";

/// PostgreSQL-backed product store
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk insert-or-update keyed by `sku`
    ///
    /// Expects SKUs within one batch to be unique; the ingestion pipeline
    /// guarantees this via its in-run dedup. Returns the number of rows
    /// applied.
    pub async fn upsert_products(&self, rows: &[ValidatedProduct]) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut skus = Vec::with_capacity(rows.len());
        let mut names = Vec::with_capacity(rows.len());
        let mut brands = Vec::with_capacity(rows.len());
        let mut colors: Vec<Option<String>> = Vec::with_capacity(rows.len());
        let mut sizes: Vec<Option<String>> = Vec::with_capacity(rows.len());
        let mut mrps = Vec::with_capacity(rows.len());
        let mut prices = Vec::with_capacity(rows.len());
        let mut quantities = Vec::with_capacity(rows.len());

        for row in rows {
            skus.push(row.sku.clone());
            names.push(row.name.clone());
            brands.push(row.brand.clone());
            colors.push(row.color.clone());
            sizes.push(row.size.clone());
            mrps.push(row.mrp);
            prices.push(row.price);
            quantities.push(row.quantity);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO products (sku, name, brand, color, size, mrp, price, quantity)
            SELECT * FROM UNNEST(
                $1::text[], $2::text[], $3::text[], $4::text[],
                $5::text[], $6::double precision[], $7::double precision[], $8::bigint[]
            )
            ON CONFLICT (sku) DO UPDATE SET
                name = EXCLUDED.name,
                brand = EXCLUDED.brand,
                color = EXCLUDED.color,
                size = EXCLUDED.size,
                mrp = EXCLUDED.mrp,
                price = EXCLUDED.price,
                quantity = EXCLUDED.quantity,
                updated_at = NOW()
            "#,
        )
        .bind(&skus)
        .bind(&names)
        .bind(&brands)
        .bind(&colors)
        .bind(&sizes)
        .bind(&mrps)
        .bind(&prices)
        .bind(&quantities)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count products matching the filter
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, sqlx::Error> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filters(&mut query, filter);
        query.build_query_scalar::<i64>().fetch_one(&self.pool).await
    }

    /// Page of products, most recently written first
    pub async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<ProductRow>, sqlx::Error> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC, sku LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Filtered page of products, cheapest first
    pub async fn search(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, sqlx::Error> {
        let mut query =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut query, filter);
        query.push(" ORDER BY price ASC, sku LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);
        query.build_query_as::<ProductRow>().fetch_all(&self.pool).await
    }

    /// Most recently written products, for the upload response sample
    pub async fn sample_recent(&self, limit: i64) -> Result<Vec<ProductRow>, sqlx::Error> {
        self.list_recent(limit, 0).await
    }

    /// Remove every product, returning the prior count
    pub async fn clear(&self) -> Result<i64, sqlx::Error> {
        let count = self.count(&ProductFilter::default()).await?;
        sqlx::query("TRUNCATE TABLE products").execute(&self.pool).await?;
        Ok(count)
    }
}

fn push_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a ProductFilter) {
    let mut prefix = " WHERE ";
    if let Some(ref brand) = filter.brand {
        query.push(prefix).push("brand = ").push_bind(brand);
        prefix = " AND ";
    }
    if let Some(ref color) = filter.color {
        query.push(prefix).push("color = ").push_bind(color);
        prefix = " AND ";
    }
    if let Some(min_price) = filter.min_price {
        query.push(prefix).push("price >= ").push_bind(min_price);
        prefix = " AND ";
    }
    if let Some(max_price) = filter.max_price {
        query.push(prefix).push("price <= ").push_bind(max_price);
    }
}

#[async_trait]
impl ProductSink for PgProductStore {
    async fn upsert_batch(&self, rows: &[ValidatedProduct]) -> anyhow::Result<u64> {
        let applied = self.upsert_products(rows).await?;
        Ok(applied)
    }
}
