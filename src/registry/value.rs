// src/registry/value.rs

//! Normalization of native-currency amounts into wei strings.

use ethers_core::types::U256;
use thiserror::Error;
use tracing::warn;

/// Fractional digits of one whole native token.
const NATIVE_DECIMALS: usize = 18;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValueError {
    #[error("negative amounts are not allowed: {0}")]
    Negative(String),
    #[error("not a decimal number: {0}")]
    NotANumber(String),
    #[error("amount does not fit in 256 bits: {0}")]
    Overflow(String),
}

/// Converts a caller-supplied amount into a wei string.
///
/// - `0x…` values pass through untouched; an uppercase `0X` prefix is
///   rewritten to `0x`.
/// - Values with a decimal point are whole-token amounts and are scaled by
///   10^18; digits past the 18th fractional place are truncated.
/// - Anything else must be a plain unsigned integer. Exponent forms such as
///   `1.5e3` are rejected rather than read as floats.
pub fn parse_wei(raw: &str) -> Result<String, ValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok("0".to_string());
    }
    if trimmed.starts_with("0x") {
        return Ok(trimmed.to_string());
    }
    if let Some(hex) = trimmed.strip_prefix("0X") {
        return Ok(format!("0x{}", hex));
    }
    if trimmed.starts_with('-') {
        return Err(ValueError::Negative(raw.to_string()));
    }

    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let wei = match unsigned.split_once('.') {
        Some((whole, fraction)) => scale_decimal(raw, whole, fraction)?,
        None => parse_digits(raw, unsigned)?,
    };
    Ok(wei.to_string())
}

/// Same as [`parse_wei`] but never fails: malformed input becomes `"0"`.
pub fn normalize_value(raw: &str) -> String {
    match parse_wei(raw) {
        Ok(wei) => wei,
        Err(e) => {
            warn!("Error formatting transaction value, defaulting to 0: {}", e);
            "0".to_string()
        }
    }
}

/// Renders a wei amount (decimal or `0x` hex) as whole tokens with six
/// fractional digits. Unparseable input renders as `"0"`.
pub fn format_wei_as_ether(wei: &str) -> String {
    let trimmed = wei.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if is_digits(trimmed) => U256::from_dec_str(trimmed).ok(),
        None => None,
    };

    let Some(amount) = parsed else {
        warn!("Error formatting value to ether: {}", wei);
        return "0".to_string();
    };

    let unit = U256::exp10(NATIVE_DECIMALS);
    let (whole, remainder) = amount.div_mod(unit);
    let micros = remainder / U256::exp10(NATIVE_DECIMALS - 6);
    format!("{}.{:06}", whole, micros.as_u64())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(raw: &str, digits: &str) -> Result<U256, ValueError> {
    if !is_digits(digits) {
        return Err(ValueError::NotANumber(raw.to_string()));
    }
    U256::from_dec_str(digits).map_err(|_| ValueError::Overflow(raw.to_string()))
}

fn scale_decimal(raw: &str, whole: &str, fraction: &str) -> Result<U256, ValueError> {
    // "5." and ".5" are both fine, "." alone is not
    if whole.is_empty() && fraction.is_empty() {
        return Err(ValueError::NotANumber(raw.to_string()));
    }
    let whole = if whole.is_empty() { U256::zero() } else { parse_digits(raw, whole)? };
    if !fraction.is_empty() && !is_digits(fraction) {
        return Err(ValueError::NotANumber(raw.to_string()));
    }

    let kept = &fraction[..fraction.len().min(NATIVE_DECIMALS)];
    let padded = format!("{:0<width$}", kept, width = NATIVE_DECIMALS);
    let fraction_wei = U256::from_dec_str(&padded).map_err(|_| ValueError::Overflow(raw.to_string()))?;

    whole
        .checked_mul(U256::exp10(NATIVE_DECIMALS))
        .and_then(|w| w.checked_add(fraction_wei))
        .ok_or_else(|| ValueError::Overflow(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_amounts_are_scaled_to_wei() {
        assert_eq!(parse_wei("1.5").unwrap(), "1500000000000000000");
        assert_eq!(parse_wei("0.000000000000000001").unwrap(), "1");
        assert_eq!(parse_wei(".25").unwrap(), "250000000000000000");
        assert_eq!(parse_wei("3.").unwrap(), "3000000000000000000");
    }

    #[test]
    fn sub_wei_remainder_is_truncated() {
        assert_eq!(parse_wei("1.0000000000000000005").unwrap(), "1000000000000000000");
        assert_eq!(parse_wei("0.0000000000000000009").unwrap(), "0");
    }

    #[test]
    fn integers_and_hex() {
        assert_eq!(parse_wei("42").unwrap(), "42");
        assert_eq!(parse_wei(" 007 ").unwrap(), "7");
        assert_eq!(parse_wei("").unwrap(), "0");
        assert_eq!(parse_wei("0xde0b6b3a7640000").unwrap(), "0xde0b6b3a7640000");
        assert_eq!(parse_wei("0X10").unwrap(), "0x10");
        assert_eq!(normalize_value(" 0XDE0B6B3A7640000 "), "0xDE0B6B3A7640000");
        // hex passes through even when it is not valid hex
        assert_eq!(parse_wei("0xnothex").unwrap(), "0xnothex");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(parse_wei("abc"), Err(ValueError::NotANumber(_))));
        assert!(matches!(parse_wei("1e18"), Err(ValueError::NotANumber(_))));
        assert!(matches!(parse_wei("1.5e3"), Err(ValueError::NotANumber(_))));
        assert!(matches!(parse_wei("1.2.3"), Err(ValueError::NotANumber(_))));
        assert!(matches!(parse_wei("."), Err(ValueError::NotANumber(_))));
        assert!(matches!(parse_wei("-1"), Err(ValueError::Negative(_))));
        let huge = "9".repeat(90);
        assert!(matches!(parse_wei(&huge), Err(ValueError::Overflow(_))));
    }

    #[test]
    fn normalize_defaults_to_zero() {
        assert_eq!(normalize_value("not a number"), "0");
        assert_eq!(normalize_value("2.5"), "2500000000000000000");
    }

    #[test]
    fn ether_display() {
        assert_eq!(format_wei_as_ether("1500000000000000000"), "1.500000");
        assert_eq!(format_wei_as_ether("0xde0b6b3a7640000"), "1.000000");
        assert_eq!(format_wei_as_ether("1234567"), "0.000000");
        assert_eq!(format_wei_as_ether("garbage"), "0");
    }
}
