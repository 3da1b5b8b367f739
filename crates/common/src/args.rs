//! Decimal-text argument parsing
//!
//! Every numeric argument reaches the ledger as text. Only plain ASCII
//! digits are accepted: no sign, no whitespace, no separators.

use crate::error::{Error, Result};

/// Parse an unsigned 64-bit integer argument
///
/// # Arguments
/// * `field` - Argument name, used in the error message
/// * `text` - The raw argument
pub fn parse_u64(field: &str, text: &str) -> Result<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_input(format!(
            "Cannot parse {}: '{}' is not an unsigned integer",
            field, text
        )));
    }
    text.parse::<u64>().map_err(|_| {
        Error::invalid_input(format!("Cannot parse {}: '{}' is out of range", field, text))
    })
}

/// Reject empty identifiers
pub fn require_non_empty<'a>(field: &str, text: &'a str) -> Result<&'a str> {
    if text.trim().is_empty() {
        return Err(Error::invalid_input(format!("{} must not be empty", field)));
    }
    Ok(text)
}
