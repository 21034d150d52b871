//! Scan cursor
//!
//! One persisted range scan: zero or more data records, then exactly one
//! end signal. Breaking out early cancels the underlying iterator; the end
//! signal still fires once.

use tracing::trace;

use crate::error::{FeedError, Result};

/// Lifecycle wrapper around a lazy store iterator
pub struct ScanCursor<I> {
    label: String,
    records: I,
    inspected: usize,
    ended: bool,
}

impl<T, I> ScanCursor<I>
where
    I: Iterator<Item = Result<T>>,
{
    pub fn new(label: impl Into<String>, records: I) -> Self {
        Self {
            label: label.into(),
            records,
            inspected: 0,
            ended: false,
        }
    }

    /// Next data record, or `None` once the range is exhausted or ended
    ///
    /// A store error is returned as-is; the store is assumed consistent, so
    /// callers propagate it.
    pub fn next_record(&mut self) -> Result<Option<T>> {
        if self.ended {
            return Ok(None);
        }
        match self.records.next() {
            Some(record) => {
                self.inspected += 1;
                record.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Deliver the end signal; returns the number of records inspected
    pub fn end(&mut self) -> Result<usize> {
        if self.ended {
            return Err(FeedError::DoubleCompletion {
                scan: self.label.clone(),
            });
        }
        self.ended = true;
        Ok(self.inspected)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

}

impl<I> Drop for ScanCursor<I> {
    fn drop(&mut self) {
        if !self.ended {
            self.ended = true;
            trace!(scan = %self.label, inspected = self.inspected, "scan released before end");
        }
    }
}
