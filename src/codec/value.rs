//! Feed values
//!
//! A published feed value is either a number or a piece of text. Text that
//! looks like a number is indexed and compared as a number.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::numeric::{encode_double, parse_numeric};

/// Value carried by a data feed publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedValue {
    Number(f64),
    Text(String),
}

/// Type tag partitioning the by-value index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    /// `n`: numbers and numeric-looking text
    Numeric,
    /// `s`: text that does not look like a number
    Textual,
}

impl ValueTag {
    pub fn as_byte(self) -> u8 {
        match self {
            ValueTag::Numeric => b'n',
            ValueTag::Textual => b's',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'n' => Some(ValueTag::Numeric),
            b's' => Some(ValueTag::Textual),
            _ => None,
        }
    }
}

impl FeedValue {
    /// Re-type a raw stored value: numeric-looking text becomes a number
    pub fn from_stored(raw: &str) -> Self {
        match parse_numeric(raw) {
            Some(n) => FeedValue::Number(n),
            None => FeedValue::Text(raw.to_string()),
        }
    }

    /// Numeric interpretation: numbers as-is, text only if it looks numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeedValue::Number(n) => Some(*n),
            FeedValue::Text(s) => parse_numeric(s),
        }
    }

    /// Index tag and order-preserving encoding of this value
    pub fn encode(&self) -> (ValueTag, Vec<u8>) {
        match self.as_number() {
            Some(n) => (ValueTag::Numeric, encode_double(n).into_bytes()),
            None => (ValueTag::Textual, self.to_string().into_bytes()),
        }
    }

    /// Same value, or same textual rendering (`5` matches `"5"`)
    pub fn loosely_equals(&self, other: &FeedValue) -> bool {
        self == other || self.to_string() == other.to_string()
    }
}

impl fmt::Display for FeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedValue::Number(n) => write_number(f, *n),
            FeedValue::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical number rendering: plain decimal for `1e-6 <= |n| < 1e21`,
/// exponent form with an explicit sign outside it (`1e+21`, `1.5e-7`)
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        return f.write_str("0");
    }
    if n.is_nan() {
        return f.write_str("NaN");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{n}");
    }

    let rendered = format!("{n:e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            write!(f, "{mantissa}e+{exponent}")
        }
        _ => f.write_str(&rendered),
    }
}

impl From<f64> for FeedValue {
    fn from(n: f64) -> Self {
        FeedValue::Number(n)
    }
}

impl From<i64> for FeedValue {
    fn from(n: i64) -> Self {
        FeedValue::Number(n as f64)
    }
}

impl From<&str> for FeedValue {
    fn from(s: &str) -> Self {
        FeedValue::Text(s.to_string())
    }
}

impl From<String> for FeedValue {
    fn from(s: String) -> Self {
        FeedValue::Text(s)
    }
}
