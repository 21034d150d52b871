//! SSTable Reader
//!
//! Opens SSTable files and serves range scans from an in-memory key index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{FeedError, Result};
use crate::storage::{directed, EntryIter, KeyIter, OrderedStore, ScanRange};

use super::{ENTRY_HEADER_SIZE, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for SSTable files with an in-memory index
///
/// Values are read on demand through a shared file handle, so scans only
/// need `&self`.
pub struct SSTableReader {
    /// File handle for reading values
    file: Mutex<BufReader<File>>,
    /// In-memory index: key → file offset
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Validates header and data CRC and loads the entire index into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(FeedError::Storage(format!(
                "SSTable too short: {} bytes",
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(FeedError::Storage(format!(
                "Invalid SSTable magic: expected FDIX, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(FeedError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = read_u64(&header[6..14]);

        // Footer: index offset + data CRC
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = read_u64(&footer[0..8]);
        let data_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(FeedError::Storage(format!(
                "SSTable index offset out of bounds: {}",
                index_offset
            )));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut data = vec![0u8; (index_offset - HEADER_SIZE) as usize];
        file.read_exact(&mut data)?;
        if crc32fast::hash(&data) != data_crc {
            return Err(FeedError::Storage("SSTable data CRC mismatch".to_string()));
        }

        // Index block: [key_len(4)][offset(8)][key] ...
        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.read_exact(&mut index_data)?;

        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < index_data.len() {
            if pos + 12 > index_data.len() {
                return Err(FeedError::Storage("Truncated SSTable index entry".to_string()));
            }
            let key_len = read_u32(&index_data[pos..pos + 4]) as usize;
            let offset = read_u64(&index_data[pos + 4..pos + 12]);
            pos += 12;

            if pos + key_len > index_data.len() {
                return Err(FeedError::Storage("Truncated SSTable index key".to_string()));
            }
            index.insert(index_data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }

        if index.len() as u64 != entry_count {
            return Err(FeedError::Storage(format!(
                "SSTable index has {} entries, header says {}",
                index.len(),
                entry_count
            )));
        }

        Ok(Self {
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
        })
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Read the value of the entry starting at `offset`
    fn read_value(&self, offset: u64) -> Result<Vec<u8>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; ENTRY_HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        let key_len = read_u32(&header[0..4]);
        let val_len = read_u32(&header[4..8]);

        // Skip the key (we already know it matches)
        file.seek(SeekFrom::Current(i64::from(key_len)))?;

        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;
        Ok(value)
    }
}

impl OrderedStore for SSTableReader {
    fn keys(&self, range: &ScanRange) -> Result<KeyIter<'_>> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = self
            .index
            .range::<[u8], _>(range.bounds())
            .map(|(key, _)| Ok::<_, FeedError>(key.clone()));
        Ok(directed(iter, range))
    }

    fn entries(&self, range: &ScanRange) -> Result<EntryIter<'_>> {
        if range.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = self
            .index
            .range::<[u8], _>(range.bounds())
            .map(|(key, &offset)| self.read_value(offset).map(|value| (key.clone(), value)));
        Ok(directed(iter, range))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
