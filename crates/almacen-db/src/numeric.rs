//! Decimal → floating-point normalization at the storage boundary.
//!
//! NUMERIC columns surface from sqlx as [`BigDecimal`]. Every repository
//! converts them here, in one place, so arbitrary-precision types never leak
//! into the wire models.

use bigdecimal::ToPrimitive;
use sqlx::types::BigDecimal;

/// Convert an optional NUMERIC value, keeping `None`.
pub fn decimal_to_f64(value: Option<BigDecimal>) -> Option<f64> {
    value.as_ref().and_then(BigDecimal::to_f64)
}

/// Convert a NUMERIC value that is defaulted in SQL (COALESCE(…, 0)).
pub fn decimal_to_f64_or_zero(value: Option<BigDecimal>) -> f64 {
    decimal_to_f64(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_decimal_conversion() {
        let d = BigDecimal::from_str("12.50").unwrap();
        assert_eq!(decimal_to_f64(Some(d)), Some(12.5));
        assert_eq!(decimal_to_f64(None), None);
    }

    #[test]
    fn test_defaulted_conversion() {
        let d = BigDecimal::from_str("-3.25").unwrap();
        assert_eq!(decimal_to_f64_or_zero(Some(d)), -3.25);
        assert_eq!(decimal_to_f64_or_zero(None), 0.0);
    }
}
