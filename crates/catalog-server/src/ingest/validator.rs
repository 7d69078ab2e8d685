//! Product row validation
//!
//! Pure functions: raw string fields in, typed row or error list out. No
//! I/O, no state. Every rule is evaluated independently so a row carries
//! all of its violations at once.

use super::models::{PartialProduct, RawRecord, RowValidation};

/// Fields that must be present and non-blank
const REQUIRED_FIELDS: &[&str] = &["sku", "name", "brand", "mrp", "price"];

/// Validate a single raw record against the product business rules
///
/// Rules, all checked, none short-circuiting another:
///
/// 1. `sku`, `name`, `brand`, `mrp`, `price` present and non-blank
/// 2. `mrp` parses as a finite number
/// 3. `price` parses as a finite number
/// 4. `quantity` parses as a whole number when present; absent means 0
/// 5. `price <= mrp` when both parsed
/// 6. `quantity >= 0` when parsed
///
/// `color` and `size` are optional; blank values become `None`.
pub fn validate_row(raw: &RawRecord) -> RowValidation {
    let mut errors = Vec::new();

    for field in REQUIRED_FIELDS {
        if trimmed(raw, field).is_empty() {
            errors.push(format!("{} is required", field));
        }
    }

    let mrp = parse_number(trimmed(raw, "mrp"));
    let price = parse_number(trimmed(raw, "price"));
    // Absent or blank quantity defaults to 0 without error. Quantities are
    // stock counts, so a fractional value is rejected, not truncated.
    let quantity = match trimmed(raw, "quantity") {
        "" => Some(0.0),
        value => parse_number(value).filter(|q| q.fract() == 0.0),
    };

    if mrp.is_none() {
        errors.push("mrp must be a number".to_string());
    }
    if price.is_none() {
        errors.push("price must be a number".to_string());
    }
    if quantity.is_none() {
        errors.push("quantity must be a number".to_string());
    }

    if let (Some(mrp), Some(price)) = (mrp, price) {
        if price > mrp {
            errors.push("price must be <= mrp".to_string());
        }
    }
    if let Some(quantity) = quantity {
        if quantity < 0.0 {
            errors.push("quantity must be >= 0".to_string());
        }
    }

    let parsed = PartialProduct {
        sku: trimmed(raw, "sku").to_string(),
        name: trimmed(raw, "name").to_string(),
        brand: trimmed(raw, "brand").to_string(),
        color: optional(raw, "color"),
        size: optional(raw, "size"),
        mrp,
        price,
        quantity: quantity.map(|q| q as i64).unwrap_or(0),
    };

    RowValidation {
        valid: errors.is_empty(),
        errors,
        parsed,
    }
}

fn trimmed<'a>(raw: &'a RawRecord, field: &str) -> &'a str {
    raw.get(field).map(|v| v.trim()).unwrap_or("")
}

fn optional(raw: &RawRecord, field: &str) -> Option<String> {
    match trimmed(raw, field) {
        "" => None,
        value => Some(value.to_string()),
    }
}

/// Parse a finite number; rejects blanks, "NaN", and infinities
fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> RawRecord {
        fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn full_record() -> RawRecord {
        record(&[
            ("sku", "TSHIRT-RED-001"),
            ("name", "Classic Cotton T-Shirt"),
            ("brand", "StreamThreads"),
            ("color", "Red"),
            ("size", "M"),
            ("mrp", "799"),
            ("price", "499"),
            ("quantity", "20"),
        ])
    }

    #[test]
    fn test_valid_row() {
        let result = validate_row(&full_record());
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.parsed.mrp, Some(799.0));
        assert_eq!(result.parsed.price, Some(499.0));
        assert_eq!(result.parsed.quantity, 20);

        let product = result.into_product().unwrap();
        assert_eq!(product.sku, "TSHIRT-RED-001");
        assert_eq!(product.color.as_deref(), Some("Red"));
    }

    #[test]
    fn test_each_required_field_in_isolation() {
        for field in ["sku", "name", "brand", "mrp", "price"] {
            let mut raw = full_record();
            raw.insert(field.to_string(), "   ".to_string());
            let result = validate_row(&raw);
            assert!(!result.valid);
            assert!(
                result.errors.contains(&format!("{} is required", field)),
                "missing '{} is required' in {:?}",
                field,
                result.errors
            );
        }
    }

    #[test]
    fn test_blank_numeric_field_fails_both_rules() {
        let mut raw = full_record();
        raw.insert("price".to_string(), "".to_string());
        let result = validate_row(&raw);
        assert!(result.errors.contains(&"price is required".to_string()));
        assert!(result.errors.contains(&"price must be a number".to_string()));
        assert_eq!(result.parsed.price, None);
    }

    #[test]
    fn test_non_numeric_mrp_and_price() {
        let mut raw = full_record();
        raw.insert("mrp".to_string(), "seven".to_string());
        raw.insert("price".to_string(), "free".to_string());
        let result = validate_row(&raw);
        assert!(result.errors.contains(&"mrp must be a number".to_string()));
        assert!(result.errors.contains(&"price must be a number".to_string()));
        // The comparison rule needs both numbers, so it must not fire here.
        assert!(!result.errors.contains(&"price must be <= mrp".to_string()));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut raw = full_record();
        raw.insert("mrp".to_string(), "NaN".to_string());
        let result = validate_row(&raw);
        assert!(result.errors.contains(&"mrp must be a number".to_string()));

        let mut raw = full_record();
        raw.insert("price".to_string(), "inf".to_string());
        let result = validate_row(&raw);
        assert!(result.errors.contains(&"price must be a number".to_string()));
    }

    #[test]
    fn test_price_greater_than_mrp() {
        let mut raw = full_record();
        raw.insert("mrp".to_string(), "499".to_string());
        raw.insert("price".to_string(), "799".to_string());
        let result = validate_row(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["price must be <= mrp".to_string()]);
    }

    #[test]
    fn test_price_equal_to_mrp_is_valid() {
        let mut raw = full_record();
        raw.insert("mrp".to_string(), "499".to_string());
        raw.insert("price".to_string(), "499".to_string());
        assert!(validate_row(&raw).valid);
    }

    #[test]
    fn test_negative_quantity() {
        let mut raw = full_record();
        raw.insert("quantity".to_string(), "-3".to_string());
        let result = validate_row(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["quantity must be >= 0".to_string()]);
        assert_eq!(result.parsed.quantity, -3);
    }

    #[test]
    fn test_absent_quantity_defaults_to_zero() {
        let mut raw = full_record();
        raw.remove("quantity");
        let result = validate_row(&raw);
        assert!(result.valid);
        assert_eq!(result.parsed.quantity, 0);

        let mut raw = full_record();
        raw.insert("quantity".to_string(), "".to_string());
        let result = validate_row(&raw);
        assert!(result.valid);
        assert_eq!(result.parsed.quantity, 0);
    }

    #[test]
    fn test_unparseable_quantity() {
        let mut raw = full_record();
        raw.insert("quantity".to_string(), "many".to_string());
        let result = validate_row(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["quantity must be a number".to_string()]);
        // Best-effort view falls back to 0 for an unparseable quantity.
        assert_eq!(result.parsed.quantity, 0);
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let mut raw = full_record();
        raw.insert("quantity".to_string(), "2.5".to_string());
        let result = validate_row(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["quantity must be a number".to_string()]);
        assert_eq!(result.parsed.quantity, 0);

        // A whole number written with a decimal point is still a count.
        let mut raw = full_record();
        raw.insert("quantity".to_string(), "2.0".to_string());
        let result = validate_row(&raw);
        assert!(result.valid);
        assert_eq!(result.parsed.quantity, 2);
    }

    #[test]
    fn test_multiple_simultaneous_violations() {
        let raw = record(&[
            ("sku", ""),
            ("name", ""),
            ("brand", "NoBrand"),
            ("mrp", "abc"),
            ("price", "100"),
            ("quantity", "-1"),
        ]);
        let result = validate_row(&raw);
        assert!(!result.valid);
        assert!(result.errors.len() >= 4, "expected >= 4 errors, got {:?}", result.errors);
        assert!(result.errors.contains(&"sku is required".to_string()));
        assert!(result.errors.contains(&"name is required".to_string()));
        assert!(result.errors.contains(&"mrp must be a number".to_string()));
        assert!(result.errors.contains(&"quantity must be >= 0".to_string()));
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let mut raw = full_record();
        raw.insert("color".to_string(), "  ".to_string());
        raw.remove("size");
        let result = validate_row(&raw);
        assert!(result.valid);
        assert_eq!(result.parsed.color, None);
        assert_eq!(result.parsed.size, None);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let mut raw = full_record();
        raw.insert("sku".to_string(), " TSHIRT-001 ".to_string());
        let result = validate_row(&raw);
        assert!(result.valid);
        assert_eq!(result.parsed.sku, "TSHIRT-001");
    }

    #[test]
    fn test_invalid_row_never_promotes() {
        let mut raw = full_record();
        raw.insert("price".to_string(), "9999".to_string());
        assert!(validate_row(&raw).into_product().is_none());
    }
}
