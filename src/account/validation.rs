//! Input validation for account identifiers
//!
//! `Iban` is a validated account identifier. The field is private to force
//! validation through [`Iban::new`].

use std::fmt;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for account identifiers
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("IBAN checksum mismatch: '{0}'")]
    ChecksumMismatch(String),
}

/// Normalize an account identifier for comparison and lookup.
///
/// Removes spaces and uppercases; does not validate.
pub fn normalize_iban(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// ============================================================================
// Iban - Validated Account Identifier (Private Field)
// ============================================================================

/// Validated IBAN (normalized, structurally valid, mod-97 checksum ok)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iban(String);

impl Iban {
    pub const MIN_LEN: usize = 15;
    pub const MAX_LEN: usize = 34;

    /// Create a new validated Iban
    ///
    /// # Validation Rules
    /// - Spaces are removed and letters uppercased first
    /// - Length: 15-34 characters
    /// - Two-letter country code, two check digits, alphanumeric BBAN
    /// - ISO 13616 mod-97 checksum equals 1
    ///
    /// # Examples
    /// ```
    /// use banking_engine::account::validation::Iban;
    ///
    /// let iban = Iban::new("gb82 west 1234 5698 7654 32").unwrap();
    /// assert_eq!(iban.as_str(), "GB82WEST12345698765432");
    ///
    /// assert!(Iban::new("GB00WEST12345698765432").is_err()); // bad checksum
    /// ```
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let iban = normalize_iban(raw);

        if iban.len() < Self::MIN_LEN || iban.len() > Self::MAX_LEN {
            return Err(ValidationError::InvalidLength {
                field: "iban",
                min: Self::MIN_LEN,
                max: Self::MAX_LEN,
                actual: iban.len(),
            });
        }

        let bytes = iban.as_bytes();
        let well_formed = bytes.iter().all(|b| b.is_ascii_alphanumeric())
            && bytes.iter().take(2).all(|b| b.is_ascii_uppercase())
            && bytes.iter().skip(2).take(2).all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(ValidationError::InvalidFormat {
                field: "iban",
                value: iban,
                expected: "country code, check digits, alphanumeric account number",
            });
        }

        if mod97(&iban) != 1 {
            return Err(ValidationError::ChecksumMismatch(iban));
        }

        Ok(Self(iban))
    }

    /// Get the validated IBAN as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 13616 remainder: first four characters moved to the end, letters
/// expanded to 10..=35, remainder computed digit by digit.
fn mod97(iban: &str) -> u32 {
    let (head, tail) = iban.split_at(4);
    tail.chars()
        .chain(head.chars())
        .fold(0u32, |acc, c| match c.to_digit(36) {
            Some(v) if v >= 10 => (acc * 100 + v) % 97,
            Some(v) => (acc * 10 + v) % 97,
            None => acc,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iban_valid() {
        assert!(Iban::new("GB82WEST12345698765432").is_ok());
        assert!(Iban::new("DE89370400440532013000").is_ok());
        assert!(Iban::new("NL91ABNA0417164300").is_ok());
        assert!(Iban::new("TR330006100519786457841326").is_ok());
    }

    #[test]
    fn test_iban_normalized() {
        let iban = Iban::new("  de89 3704 0044 0532 0130 00 ").unwrap();
        assert_eq!(iban.as_str(), "DE89370400440532013000");
        assert_eq!(iban.to_string(), "DE89370400440532013000");
    }

    #[test]
    fn test_iban_invalid_length() {
        let err = Iban::new("GB82WEST").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLength { .. }));

        let err = Iban::new(&"GB82".repeat(10)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLength { .. }));
    }

    #[test]
    fn test_iban_invalid_format() {
        let err = Iban::new("1282WEST12345698765432").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        let err = Iban::new("GB82WEST1234569876543-").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_iban_checksum() {
        let err = Iban::new("GB83WEST12345698765432").unwrap_err();
        assert!(matches!(err, ValidationError::ChecksumMismatch(_)));
    }

    #[test]
    fn test_normalize_iban() {
        assert_eq!(normalize_iban(" nl91 abna 0417 1643 00"), "NL91ABNA0417164300");
    }
}
