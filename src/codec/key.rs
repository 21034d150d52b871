//! Feed index key layout
//!
//! Builders for both persisted feed indexes, scan bound helpers, and the
//! parsers that pull ordering index and value back out of a scanned key.

use crate::error::{FeedError, Result};

use super::numeric::{decode_double, decode_mci_field, encode_mci};
use super::{FeedValue, Mci, ValueTag, MCI_LEN};

const VALUE_INDEX: &[u8] = b"df";
const ADDRESS_INDEX: &[u8] = b"dfv";

/// Field separator
const SEP: u8 = b'\n';

/// First byte after `SEP` that sorts above it; closes a type sub-range
const SUB_RANGE_END: u8 = b'\r';

fn join(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEP);
        }
        key.extend_from_slice(part);
    }
    key
}

// =============================================================================
// by-value index
// =============================================================================

/// `df\n{address}\n{feed}\n{tag}\n{encoded value}`
pub fn value_prefix(address: &str, feed_name: &str, tag: ValueTag, encoded: &[u8]) -> Vec<u8> {
    join(&[
        VALUE_INDEX,
        address.as_bytes(),
        feed_name.as_bytes(),
        &[tag.as_byte()],
        encoded,
    ])
}

/// Inclusive-exclusive start of a type sub-range: `df\n{address}\n{feed}\n{tag}\n`
pub fn type_range_start(address: &str, feed_name: &str, tag: ValueTag) -> Vec<u8> {
    let mut key = join(&[VALUE_INDEX, address.as_bytes(), feed_name.as_bytes(), &[tag.as_byte()]]);
    key.push(SEP);
    key
}

/// Exclusive end of a type sub-range: `df\n{address}\n{feed}\n{tag}\r`
pub fn type_range_end(address: &str, feed_name: &str, tag: ValueTag) -> Vec<u8> {
    let mut key = join(&[VALUE_INDEX, address.as_bytes(), feed_name.as_bytes(), &[tag.as_byte()]]);
    key.push(SUB_RANGE_END);
    key
}

/// Append an encoded ordering index field to a prefix
pub fn with_mci(prefix: &[u8], mci: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 1 + mci.len());
    key.extend_from_slice(prefix);
    key.push(SEP);
    key.extend_from_slice(mci.as_bytes());
    key
}

/// Full by-value index key of one publication
pub fn value_index_key(address: &str, feed_name: &str, value: &FeedValue, mci: Mci) -> Vec<u8> {
    let (tag, encoded) = value.encode();
    with_mci(&value_prefix(address, feed_name, tag, &encoded), &encode_mci(mci))
}

// =============================================================================
// by-address index
// =============================================================================

/// `dfv\n{address}\n{feed}`
pub fn address_prefix(address: &str, feed_name: &str) -> Vec<u8> {
    join(&[ADDRESS_INDEX, address.as_bytes(), feed_name.as_bytes()])
}

/// Full by-address index key of one publication
pub fn address_index_key(address: &str, feed_name: &str, mci: Mci) -> Vec<u8> {
    with_mci(&address_prefix(address, feed_name), &encode_mci(mci))
}

/// by-address record: `{raw value}\n{unit}`
pub fn address_index_record(value: &FeedValue, unit: &str) -> Vec<u8> {
    join(&[value.to_string().as_bytes(), unit.as_bytes()])
}

// =============================================================================
// Parsers
// =============================================================================

/// Ordering index stored in the last field of either index's key
pub fn decode_mci(key: &[u8]) -> Result<Mci> {
    if key.len() <= MCI_LEN || key[key.len() - MCI_LEN - 1] != SEP {
        return Err(FeedError::malformed(key, "missing ordering index field"));
    }
    std::str::from_utf8(&key[key.len() - MCI_LEN..])
        .ok()
        .and_then(decode_mci_field)
        .ok_or_else(|| FeedError::malformed(key, "bad ordering index field"))
}

/// Typed value stored in a by-value index key
pub fn decode_value(key: &[u8]) -> Result<FeedValue> {
    let mut fields = key.splitn(5, |b| *b == SEP);
    let (Some(index), Some(_address), Some(_feed), Some(tag), Some(rest)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(FeedError::malformed(key, "too few fields"));
    };

    if index != VALUE_INDEX {
        return Err(FeedError::malformed(key, "not a by-value index key"));
    }
    let tag = match tag {
        [byte] => ValueTag::from_byte(*byte),
        _ => None,
    }
    .ok_or_else(|| FeedError::malformed(key, "unknown value type tag"))?;

    if rest.len() <= MCI_LEN || rest[rest.len() - MCI_LEN - 1] != SEP {
        return Err(FeedError::malformed(key, "missing ordering index field"));
    }
    let encoded = std::str::from_utf8(&rest[..rest.len() - MCI_LEN - 1])
        .map_err(|_| FeedError::malformed(key, "value is not UTF-8"))?;

    match tag {
        ValueTag::Numeric => decode_double(encoded)
            .map(FeedValue::Number)
            .ok_or_else(|| FeedError::malformed(key, "bad encoded number")),
        ValueTag::Textual => Ok(FeedValue::Text(encoded.to_string())),
    }
}

/// Value and unit stored in a by-address record
pub fn decode_address_record(record: &[u8]) -> Result<(FeedValue, String)> {
    let split = record
        .iter()
        .rposition(|b| *b == SEP)
        .ok_or_else(|| FeedError::malformed(record, "record has no unit field"))?;
    let raw = std::str::from_utf8(&record[..split])
        .map_err(|_| FeedError::malformed(record, "value is not UTF-8"))?;
    let unit = std::str::from_utf8(&record[split + 1..])
        .map_err(|_| FeedError::malformed(record, "unit is not UTF-8"))?;
    Ok((FeedValue::from_stored(raw), unit.to_string()))
}
