//! Codec Module
//!
//! Order-preserving encodings that make feed values and ordering indices
//! comparable with plain byte-lexicographic range scans.
//!
//! ## Responsibilities
//! - Closed two-variant feed value type (number / text)
//! - "Looks like a number" classification of textual values
//! - Fixed-width, order-preserving encoders for doubles and ordering indices
//! - Key layout of both persisted feed indexes, and parsers back out of them
//!
//! ## Key Layout
//! ```text
//! by-value:   df \n {address} \n {feed} \n {n|s} \n {value} \n {mci:8 hex}  → unit
//! by-address: dfv \n {address} \n {feed} \n {mci:8 hex}                     → {value} \n {unit}
//! ```
//!
//! Within one (address, feed) the `n` and `s` sub-ranges are contiguous and
//! never interleave: every key of a sub-range sorts between
//! `{tag}\n` and `{tag}\r`.

mod key;
mod numeric;
mod value;

pub use key::{
    address_index_key, address_index_record, address_prefix, decode_address_record, decode_mci,
    decode_value, type_range_end, type_range_start, value_index_key, value_prefix, with_mci,
};
pub use numeric::{decode_double, decode_mci_field, encode_double, encode_mci, parse_numeric};
pub use value::{FeedValue, ValueTag};

/// Ordering index (main chain index) of a finalized unit
pub type Mci = u32;

/// Width of an encoded ordering index, in hex characters
pub const MCI_LEN: usize = 8;

/// Width of an encoded double, in hex characters
pub const DOUBLE_LEN: usize = 16;

/// Largest encodable ordering index, used as the inclusive upper sentinel
pub const MAX_ENCODED_MCI: &str = "ffffffff";

/// Longest accepted mantissa (digits plus decimal point) of a numeric-looking string
pub const MAX_MANTISSA_LEN: usize = 15;
