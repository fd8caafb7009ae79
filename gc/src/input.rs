//! Parses an input file's comma-separated list of decimal numbers into the
//! signed, one-decimal fixed-point integers the comparator circuit compares.

use crate::constants::DEFAULT_SCALE;
use crate::error::{ProtocolError, Result};

/// Parses `text` as a comma-separated list of decimal values with at most
/// one fractional digit, scaling each by [`DEFAULT_SCALE`] and checking the
/// result fits in a signed `n_bits`-wide circuit.
pub fn parse_scaled_decimals(text: &str, n_bits: u32) -> Result<Vec<i64>> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_one(token, n_bits))
        .collect()
}

fn parse_one(token: &str, n_bits: u32) -> Result<i64> {
    let (sign, rest) = match token.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, token.strip_prefix('+').unwrap_or(token)),
    };

    let mut parts = rest.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::Malformed(format!("invalid decimal literal: {token:?}")));
    }
    if frac_part.len() > 1 || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::Malformed(format!(
            "expected at most one fractional digit: {token:?}"
        )));
    }

    let int_value: i64 = int_part
        .parse()
        .map_err(|_| ProtocolError::Malformed(format!("invalid decimal literal: {token:?}")))?;
    let frac_digit: i64 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().expect("validated as a single ascii digit above")
    };

    let scaled = sign * (int_value * DEFAULT_SCALE as i64 + frac_digit);
    let max = 1i64 << (n_bits - 1);
    if scaled < -max || scaled > max - 1 {
        return Err(ProtocolError::InputOutOfRange { value: scaled, bits: n_bits });
    }
    Ok(scaled)
}
