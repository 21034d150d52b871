//! Storage Module
//!
//! Ordered byte-key stores the feed indexes are scanned from.
//!
//! ## Responsibilities
//! - `OrderedStore`: forward/backward range iteration with inclusive or
//!   exclusive bounds and an optional limit, key-only or key+value
//! - `MemoryStore`: BTreeMap-backed store for embedding and tests
//! - `SSTableReader`: immutable on-disk sorted table
//!
//! Iterators are lazy; dropping one mid-way is how a scan is cancelled.
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ Entry Count  │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Block                             │
//! │ ┌────────┬────────┬─────┬───────────┐ │
//! │ │KeyLen  │ValLen  │ Key │   Value   │ │
//! │ └────────┴────────┴─────┴───────────┘ │
//! │ ... (repeated for each entry)         │
//! ├────────────────────────────────────────┤
//! │ Index Block                            │
//! ├────────────────────────────────────────┤
//! │ Footer                                 │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ Index Offset     │    CRC32        │ │
//! │ └──────────────────┴─────────────────┘ │
//! └────────────────────────────────────────┘
//! ```

mod memory;
mod sstable;

use std::ops::Bound;

pub use memory::MemoryStore;
pub use sstable::{SSTable, SSTableBuilder, SSTableReader};

use crate::error::Result;

/// Lazy key-only scan
pub type KeyIter<'a> = Box<dyn Iterator<Item = Result<Vec<u8>>> + 'a>;

/// Lazy key+value scan
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 'a>;

/// An ordered byte-key store that can be range-scanned
pub trait OrderedStore {
    /// Scan keys within `range`
    fn keys(&self, range: &ScanRange) -> Result<KeyIter<'_>>;

    /// Scan key/value pairs within `range`
    fn entries(&self, range: &ScanRange) -> Result<EntryIter<'_>>;
}

/// Bounds, direction and limit of one range scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    pub lower: Bound<Vec<u8>>,
    pub upper: Bound<Vec<u8>>,
    pub limit: Option<usize>,
    /// Iterate from the upper bound down
    pub reverse: bool,
}

impl ScanRange {
    pub fn new(lower: Bound<Vec<u8>>, upper: Bound<Vec<u8>>) -> Self {
        Self {
            lower,
            upper,
            limit: None,
            reverse: false,
        }
    }

    /// Stop after `limit` records
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Iterate newest (greatest key) first
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// True when no key can fall inside the bounds
    pub fn is_empty(&self) -> bool {
        if self.limit == Some(0) {
            return true;
        }
        match (&self.lower, &self.upper) {
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
            _ => false,
        }
    }

    /// Borrowed bounds, usable with `BTreeMap::range`
    pub(crate) fn bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        (as_slice_bound(&self.lower), as_slice_bound(&self.upper))
    }
}

fn as_slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(key) => Bound::Included(key.as_slice()),
        Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Apply direction and limit of `range` to an in-range iterator
pub(crate) fn directed<'a, T, I>(iter: I, range: &ScanRange) -> Box<dyn Iterator<Item = T> + 'a>
where
    I: DoubleEndedIterator<Item = T> + 'a,
    T: 'a,
{
    let limit = range.limit.unwrap_or(usize::MAX);
    if range.reverse {
        Box::new(iter.rev().take(limit))
    } else {
        Box::new(iter.take(limit))
    }
}
