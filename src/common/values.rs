use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};

/// Fractional digits kept for reading and threshold values (`NUMERIC(10, 2)`).
pub const VALUE_SCALE: u32 = 2;

/// Largest magnitude that fits `NUMERIC(10, 2)`.
#[must_use]
pub fn max_abs_value() -> Decimal {
    Decimal::new(9_999_999_999, VALUE_SCALE)
}

/// Round a measured or configured value to two decimals, half away from
/// zero like PostgreSQL `NUMERIC`, and check that it fits the column.
///
/// # Errors
///
/// Returns `AppError::Validation` naming `field` if the value is out of range.
pub fn normalize_value(value: Decimal, field: &str) -> AppResult<Decimal> {
    let rounded = value.round_dp_with_strategy(VALUE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let max = max_abs_value();
    if rounded.abs() > max {
        return Err(AppError::Validation(format!(
            "{field} must be between -{max} and {max}, got {value}"
        )));
    }
    Ok(rounded)
}
