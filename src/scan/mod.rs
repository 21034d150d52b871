//! Scan Module
//!
//! Persisted range scans over the feed indexes of one address.
//!
//! ## Responsibilities
//! - Translate a relation and value into by-value index bounds
//! - Existence: find one witness inside the ordering window, then cancel
//! - Value read: newest-first scan of the by-value or by-address index,
//!   merged into a running `FeedResult`
//!
//! Each scan owns a `ScanCursor` that delivers its end signal exactly once.

mod cursor;

use std::ops::Bound;

use tracing::debug;

pub use cursor::ScanCursor;

use crate::codec::{
    address_prefix, decode_address_record, decode_mci, decode_value, encode_mci, type_range_end,
    type_range_start, value_prefix, with_mci, FeedValue, Mci, MAX_ENCODED_MCI,
};
use crate::error::{FeedError, Result};
use crate::query::{FeedResult, TiePolicy};
use crate::relation::Relation;
use crate::storage::{OrderedStore, ScanRange};

/// By-value index bounds for `feed REL value` on one address
///
/// `!=` has no single range; it is answered as `>` then `<`.
pub fn relation_range(
    address: &str,
    feed_name: &str,
    relation: Relation,
    value: &FeedValue,
    min_mci: Mci,
    max_mci: Mci,
) -> Option<ScanRange> {
    let (tag, encoded) = value.encode();
    let prefix = value_prefix(address, feed_name, tag, &encoded);
    let type_start = || Bound::Excluded(type_range_start(address, feed_name, tag));
    let type_end = || Bound::Excluded(type_range_end(address, feed_name, tag));

    let range = match relation {
        Relation::Eq => ScanRange::new(
            Bound::Included(with_mci(&prefix, &encode_mci(min_mci))),
            Bound::Included(with_mci(&prefix, &encode_mci(max_mci))),
        )
        .limit(1),
        Relation::Ge => ScanRange::new(Bound::Included(prefix), type_end()),
        Relation::Gt => ScanRange::new(
            Bound::Excluded(with_mci(&prefix, MAX_ENCODED_MCI)),
            type_end(),
        ),
        Relation::Le => ScanRange::new(
            type_start(),
            Bound::Included(with_mci(&prefix, MAX_ENCODED_MCI)),
        ),
        Relation::Lt => ScanRange::new(type_start(), Bound::Excluded(prefix)),
        Relation::Ne => return None,
    };
    Some(range)
}

/// Whether `address` has a persisted publication with `feed REL value`
/// inside `[min_mci, max_mci]`
pub fn feed_by_address_exists<S>(
    store: &S,
    address: &str,
    feed_name: &str,
    relation: Relation,
    value: &FeedValue,
    min_mci: Mci,
    max_mci: Mci,
) -> Result<bool>
where
    S: OrderedStore + ?Sized,
{
    let Some(range) = relation_range(address, feed_name, relation, value, min_mci, max_mci) else {
        return Ok(
            feed_by_address_exists(store, address, feed_name, Relation::Gt, value, min_mci, max_mci)?
                || feed_by_address_exists(store, address, feed_name, Relation::Lt, value, min_mci, max_mci)?,
        );
    };

    let label = format!("{address} {feed_name}{relation}{value}");
    let mut cursor = ScanCursor::new(label, store.keys(&range)?);
    let mut found = false;

    while let Some(key) = cursor.next_record()? {
        // Equality bounds already pin the ordering window
        if relation == Relation::Eq || (min_mci..=max_mci).contains(&decode_mci(&key)?) {
            found = true;
            break;
        }
    }

    let inspected = cursor.end()?;
    debug!(
        scan = %cursor.label(),
        found,
        inspected,
        "data feed existence scan finished"
    );
    Ok(found)
}

/// Merge the newest persisted publication(s) of `feed` by `address` into
/// `result`
///
/// Scans the by-value index when `value` is given, the by-address index
/// otherwise. Under `Abort` a second qualifying record marks the result
/// ambiguous and stops this address.
#[allow(clippy::too_many_arguments)]
pub fn read_feed_by_address<S>(
    store: &S,
    address: &str,
    feed_name: &str,
    value: Option<&FeedValue>,
    min_mci: Mci,
    max_mci: Mci,
    policy: TiePolicy,
    result: &mut FeedResult,
) -> Result<()>
where
    S: OrderedStore + ?Sized,
{
    let prefix = match value {
        Some(v) => {
            let (tag, encoded) = v.encode();
            value_prefix(address, feed_name, tag, &encoded)
        }
        None => address_prefix(address, feed_name),
    };
    let abort_if_several = policy == TiePolicy::Abort;
    let range = ScanRange::new(
        Bound::Included(with_mci(&prefix, &encode_mci(min_mci))),
        Bound::Included(with_mci(&prefix, &encode_mci(max_mci))),
    )
    .reversed()
    .limit(if abort_if_several { 2 } else { 1 });

    let label = format!("{address} {feed_name}");
    let mut cursor = ScanCursor::new(label, store.entries(&range)?);

    while let Some((key, record)) = cursor.next_record()? {
        if abort_if_several && result.value.is_some() {
            result.ambiguous = true;
            break;
        }

        let mci = decode_mci(&key)?;
        let fresher = policy == TiePolicy::Last && result.mci.map_or(true, |current| mci > current);
        if result.value.is_none() || fresher {
            let (feed_value, unit) = match value {
                Some(_) => (decode_value(&key)?, unit_id(&record)?),
                None => decode_address_record(&record)?,
            };
            result.value = Some(feed_value);
            result.unit = Some(unit);
            result.mci = Some(mci);
        }
    }

    let inspected = cursor.end()?;
    debug!(
        scan = %cursor.label(),
        inspected,
        ambiguous = result.ambiguous,
        "data feed value scan finished"
    );
    Ok(())
}

fn unit_id(record: &[u8]) -> Result<String> {
    String::from_utf8(record.to_vec()).map_err(|_| FeedError::malformed(record, "unit is not UTF-8"))
}
