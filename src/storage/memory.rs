//! In-memory ordered store
//!
//! BTreeMap-based store with the same scan semantics as an SSTable.

use std::collections::BTreeMap;

use crate::error::{FeedError, Result};

use super::{directed, EntryIter, KeyIter, OrderedStore, ScanRange};

/// Ordered in-memory key-value store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a key
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sorted iteration over every entry (for writing an SSTable)
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.data.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl OrderedStore for MemoryStore {
    fn keys(&self, range: &ScanRange) -> Result<KeyIter<'_>> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = self
            .data
            .range::<[u8], _>(range.bounds())
            .map(|(key, _)| Ok::<_, FeedError>(key.clone()));
        Ok(directed(iter, range))
    }

    fn entries(&self, range: &ScanRange) -> Result<EntryIter<'_>> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = self
            .data
            .range::<[u8], _>(range.bounds())
            .map(|(key, value)| Ok::<_, FeedError>((key.clone(), value.clone())));
        Ok(directed(iter, range))
    }
}
