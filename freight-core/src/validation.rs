use bigdecimal::{BigDecimal, RoundingMode};

use crate::error::ValidationError;

/// Column shape of a NUMERIC(precision, scale) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericSpec {
    pub precision: u32,
    pub scale: i64,
}

/// NUMERIC(10,2): mass and volume capacities.
pub const CAPACITY: NumericSpec = NumericSpec { precision: 10, scale: 2 };
/// NUMERIC(6,2): cargo-area dimensions.
pub const DIMENSION: NumericSpec = NumericSpec { precision: 6, scale: 2 };

/// Require a non-blank value of at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    max_length(field, value, max)
}

pub fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Round `value` half-up to the column scale and reject it when the integer
/// part no longer fits the column precision.
pub fn fit_numeric(
    field: &'static str,
    value: &BigDecimal,
    numeric: NumericSpec,
) -> Result<BigDecimal, ValidationError> {
    let rounded = value.with_scale_round(numeric.scale, RoundingMode::HalfUp);
    let integer_digits = numeric.precision - numeric.scale as u32;
    let limit = BigDecimal::from(10_i64.pow(integer_digits));

    if rounded.abs() >= limit {
        return Err(ValidationError::PrecisionExceeded {
            field,
            precision: numeric.precision,
            scale: numeric.scale,
        });
    }
    Ok(rounded)
}

pub fn fit_optional_numeric(
    field: &'static str,
    value: Option<&BigDecimal>,
    numeric: NumericSpec,
) -> Result<Option<BigDecimal>, ValidationError> {
    value.map(|v| fit_numeric(field, v, numeric)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_required_text() {
        assert!(required_text("make", "Volvo", 100).is_ok());
        assert_eq!(
            required_text("make", "   ", 100),
            Err(ValidationError::Empty { field: "make" })
        );
        assert_eq!(
            required_text("registration_number", &"X".repeat(51), 50),
            Err(ValidationError::TooLong {
                field: "registration_number",
                max: 50,
                actual: 51
            })
        );
        assert!(required_text("registration_number", &"X".repeat(50), 50).is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 50 two-byte characters
        let value = "é".repeat(50);
        assert!(max_length("registration_number", &value, 50).is_ok());
    }

    #[test]
    fn test_fit_numeric_rounds_half_up() {
        assert_eq!(fit_numeric("capacity_kg", &dec("12.345"), CAPACITY).unwrap(), dec("12.35"));
        assert_eq!(fit_numeric("capacity_kg", &dec("12.344"), CAPACITY).unwrap(), dec("12.34"));
        assert_eq!(fit_numeric("capacity_kg", &dec("7"), CAPACITY).unwrap(), dec("7.00"));
    }

    #[test]
    fn test_fit_numeric_capacity_bounds() {
        assert!(fit_numeric("capacity_kg", &dec("99999999.99"), CAPACITY).is_ok());
        assert!(fit_numeric("capacity_kg", &dec("100000000"), CAPACITY).is_err());
        // rounds up past the limit
        assert_eq!(
            fit_numeric("capacity_kg", &dec("99999999.995"), CAPACITY),
            Err(ValidationError::PrecisionExceeded {
                field: "capacity_kg",
                precision: 10,
                scale: 2
            })
        );
    }

    #[test]
    fn test_fit_numeric_dimension_bounds() {
        assert!(fit_numeric("length", &dec("9999.99"), DIMENSION).is_ok());
        assert!(fit_numeric("length", &dec("10000.00"), DIMENSION).is_err());
        assert!(fit_numeric("length", &dec("-10000.00"), DIMENSION).is_err());
    }

    #[test]
    fn test_fit_optional_numeric() {
        assert_eq!(fit_optional_numeric("width", None, DIMENSION), Ok(None));
        assert_eq!(
            fit_optional_numeric("width", Some(&dec("2.5")), DIMENSION),
            Ok(Some(dec("2.50")))
        );
    }
}
