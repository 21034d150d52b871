//! Numeric primitives
//!
//! Numeric-string detection and the fixed-width hex encoders for doubles and
//! ordering indices.

use super::{Mci, DOUBLE_LEN, MAX_MANTISSA_LEN, MCI_LEN};

const SIGN_BIT: u64 = 1 << 63;

/// Parse a textual feed value that looks like a decimal number
///
/// Accepts `[+-]digits[.digits][(e|E)[+-]digits]`. Returns `None` for
/// anything else, for non-finite results, for mantissas longer than
/// `MAX_MANTISSA_LEN` characters, and for non-zero mantissas that underflow
/// to zero.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    // Mantissa: integer part, optional fraction
    let mantissa_start = pos;
    let int_digits = count_digits(&bytes[pos..]);
    if int_digits == 0 {
        return None;
    }
    pos += int_digits;

    if bytes.get(pos) == Some(&b'.') {
        let frac_digits = count_digits(&bytes[pos + 1..]);
        if frac_digits == 0 {
            return None;
        }
        pos += 1 + frac_digits;
    }
    let mantissa = &bytes[mantissa_start..pos];

    // Optional exponent
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = count_digits(&bytes[pos..]);
        if exp_digits == 0 {
            return None;
        }
        pos += exp_digits;
    }

    if pos != bytes.len() || mantissa.len() > MAX_MANTISSA_LEN {
        return None;
    }

    let parsed: f64 = text.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }

    // e.g. 1.23e-700
    let mantissa_nonzero = mantissa.iter().any(|b| b.is_ascii_digit() && *b != b'0');
    if parsed == 0.0 && mantissa_nonzero {
        return None;
    }

    Some(parsed)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Encode a double so that byte order of the output equals numeric order
///
/// Non-negative values get the sign bit set; negative values have every bit
/// inverted. `-0.0` and `0.0` encode identically.
pub fn encode_double(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    let ordered = if bits & SIGN_BIT == 0 { bits ^ SIGN_BIT } else { !bits };
    format!("{ordered:016x}")
}

/// Inverse of `encode_double`
pub fn decode_double(encoded: &str) -> Option<f64> {
    if encoded.len() != DOUBLE_LEN || !is_lower_hex(encoded) {
        return None;
    }
    let ordered = u64::from_str_radix(encoded, 16).ok()?;
    let bits = if ordered & SIGN_BIT != 0 { ordered ^ SIGN_BIT } else { !ordered };
    Some(f64::from_bits(bits))
}

/// Encode an ordering index as fixed-width lowercase hex
pub fn encode_mci(mci: Mci) -> String {
    format!("{mci:08x}")
}

/// Parse an encoded ordering index field
pub fn decode_mci_field(field: &str) -> Option<Mci> {
    if field.len() != MCI_LEN || !is_lower_hex(field) {
        return None;
    }
    Mci::from_str_radix(field, 16).ok()
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
