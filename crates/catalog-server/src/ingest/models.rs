//! Data model for the ingestion pipeline
//!
//! Everything here is scoped to a single upload: records, validation
//! outcomes, and the run summary are built in memory, returned to the
//! caller, and discarded. Only [`ValidatedProduct`] rows outlive the run,
//! and only once the sink has persisted them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One parsed CSV row as a column-name-to-string mapping, prior to
/// validation. Values are trimmed of surrounding whitespace by the parser.
pub type RawRecord = HashMap<String, String>;

/// A product row that has passed every validation rule
///
/// Only constructed via [`RowValidation::into_product`], so the field
/// invariants (non-blank required fields, finite non-negative numbers,
/// `price <= mrp`, `quantity >= 0`) always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub mrp: f64,
    pub price: f64,
    pub quantity: i64,
}

/// Best-effort typed view of a row, populated regardless of validity
///
/// Unparseable numeric fields are `None`; an unparseable quantity falls back
/// to 0. Useful for presenting partial data next to the error list, but
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub mrp: Option<f64>,
    pub price: Option<f64>,
    pub quantity: i64,
}

/// Outcome of validating a single [`RawRecord`]
///
/// All rules are evaluated independently, so `errors` carries one entry per
/// violated rule rather than stopping at the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub parsed: PartialProduct,
}

impl RowValidation {
    /// Promote to a [`ValidatedProduct`], available only when fully valid
    pub fn into_product(self) -> Option<ValidatedProduct> {
        if !self.valid {
            return None;
        }
        let parsed = self.parsed;
        Some(ValidatedProduct {
            sku: parsed.sku,
            name: parsed.name,
            brand: parsed.brand,
            color: parsed.color,
            size: parsed.size,
            mrp: parsed.mrp?,
            price: parsed.price?,
            quantity: parsed.quantity,
        })
    }
}

/// One rejected row of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    /// 1-based position of the row within the upload
    pub row: u64,
    /// One message per violated rule, in rule order
    pub errors: Vec<String>,
    /// The offending record, as parsed
    pub raw: RawRecord,
}

/// Aggregate result of one ingestion run
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IngestionSummary {
    /// Rows handed to the sink in successfully submitted batches
    pub stored: u64,
    /// Rejected rows, in input order
    pub failed: Vec<RowFailure>,
}
