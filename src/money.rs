//! Money Parsing and Formatting
//!
//! All client-facing amounts enter and leave the engine through this module.
//! Amounts are `rust_decimal::Decimal` values at a fixed storage scale; input
//! with more fractional digits than the storage scale is rejected, never
//! rounded.
//!
//! ## Usage
//! ```rust
//! use banking_engine::money::{format_amount, parse_amount};
//!
//! let amount = parse_amount("150.5").unwrap();
//! assert_eq!(format_amount(amount), "150.50");
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Fractional digits stored for balances, limits and transfer amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Fractional digits always shown when formatting for humans.
pub const DISPLAY_SCALE: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

/// Money parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must not carry a sign")]
    Signed,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Client → Decimal
// ============================================================================

/// Parse a client amount string into a storage-scale `Decimal`.
///
/// Accepts plain decimal notation (`"100"`, `"0.5"`, `"12.3456"`). Rejects
/// signs, exponents, `".5"`, `"5."` and more than [`AMOUNT_SCALE`] fractional
/// digits. Zero is accepted here; positivity is a business rule.
pub fn parse_amount(amount_str: &str) -> Result<Decimal, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::Signed);
    }

    let (whole, frac) = match amount_str.split_once('.') {
        None => (amount_str, ""),
        Some((whole, frac)) => {
            // Require both sides of the dot, ".5" and "5." are ambiguous
            if whole.is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if frac.is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (whole, frac)
        }
    };

    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in amount: {}",
            amount_str
        )));
    }

    let provided = frac.len() as u32;
    if provided > AMOUNT_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided,
            max: AMOUNT_SCALE,
        });
    }

    Decimal::from_str(amount_str).map_err(|e| MoneyError::InvalidFormat(e.to_string()))
}

/// Validate a `Decimal` that already went through serde (JSON number input).
pub fn check_scale(amount: Decimal) -> Result<Decimal, MoneyError> {
    let normalized = amount.normalize();
    if normalized.scale() > AMOUNT_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided: normalized.scale(),
            max: AMOUNT_SCALE,
        });
    }
    Ok(amount)
}

// ============================================================================
// Format: Decimal → Client
// ============================================================================

/// Format an amount for receipts, emails and logs.
///
/// Always shows at least [`DISPLAY_SCALE`] fractional digits and drops
/// trailing zeros beyond that.
pub fn format_amount(amount: Decimal) -> String {
    let mut normalized = amount.normalize();
    if normalized.scale() < DISPLAY_SCALE {
        normalized.rescale(DISPLAY_SCALE);
    }
    normalized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(parse_amount("100").unwrap(), dec!(100));
        assert_eq!(parse_amount("0.5").unwrap(), dec!(0.5));
        assert_eq!(parse_amount(" 12.3456 ").unwrap(), dec!(12.3456));
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects_ambiguous_formats() {
        assert!(matches!(
            parse_amount(".5"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("5."),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("1.2.3"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("1e5"),
            Err(MoneyError::InvalidFormat(_))
        ));
        assert!(matches!(parse_amount(""), Err(MoneyError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_amount_rejects_sign_and_precision() {
        assert_eq!(parse_amount("-1"), Err(MoneyError::Signed));
        assert_eq!(parse_amount("+1"), Err(MoneyError::Signed));
        assert_eq!(
            parse_amount("1.23456"),
            Err(MoneyError::PrecisionOverflow {
                provided: 5,
                max: AMOUNT_SCALE
            })
        );
    }

    #[test]
    fn test_check_scale_ignores_trailing_zeros() {
        assert!(check_scale(dec!(1.50000000)).is_ok());
        assert!(check_scale(dec!(1.00001)).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(100.5000)), "100.50");
        assert_eq!(format_amount(dec!(0.1234)), "0.1234");
    }
}
