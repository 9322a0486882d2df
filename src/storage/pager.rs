//! Disk-backed pager persisting fixed-size pages in a single file
//!
//! File layout:
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | magic bytes `MDB1`                     |
//! | 4      | 4    | page size, little-endian u32           |
//! | 8      | 8    | logical blob length, little-endian u64 |
//! | 16     | N    | concatenated pages                     |

use std::{fs, io::ErrorKind, path::PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    storage::engine::Engine,
};

pub const DEFAULT_PAGE_SIZE: usize = 4096;

const MAGIC: &[u8; 4] = b"MDB1";
const HEADER_SIZE: usize = 16;

/// Pager statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerStats {
    pub pages: usize,
    pub page_size: usize,
}

/// File-backed page store
///
/// All pages are held in memory; every write rewrites the whole file.
pub struct Pager {
    path: PathBuf,
    page_size: usize,
    pages: Vec<Vec<u8>>,
    /// Logical blob length, so padding in the last page can be dropped on read
    length: usize,
}

impl Pager {
    /// Opens the page file at `path`, loading any prior state.
    ///
    /// A missing, truncated or foreign file is treated as empty. The page size
    /// recorded in an existing file takes precedence over `page_size`.
    pub fn open(path: impl Into<PathBuf>, page_size: usize) -> Result<Self> {
        if page_size == 0 || u32::try_from(page_size).is_err() {
            return Err(Error::Internal(format!("invalid page size {}", page_size)));
        }
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut pager = Self {
            path,
            page_size,
            pages: Vec::new(),
            length: 0,
        };
        pager.load()?;
        Ok(pager)
    }

    /// Allocates a fresh zeroed page and returns its index
    pub fn allocate_page(&mut self) -> usize {
        self.pages.push(vec![0; self.page_size]);
        self.pages.len() - 1
    }

    /// Writes `data` at the start of page `index`, growing the file as needed.
    /// Bytes beyond the page size are discarded.
    pub fn write_page(&mut self, index: usize, data: &[u8]) -> Result<()> {
        while index >= self.pages.len() {
            self.allocate_page();
        }
        let len = data.len().min(self.page_size);
        self.pages[index][..len].copy_from_slice(&data[..len]);
        self.flush()
    }

    pub fn read_page(&self, index: usize) -> Option<&[u8]> {
        self.pages.get(index).map(|p| p.as_slice())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Logical length of the stored blob
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn stats(&self) -> PagerStats {
        PagerStats {
            pages: self.pages.len(),
            page_size: self.page_size,
        }
    }

    fn load(&mut self) -> Result<()> {
        let data = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        if data.len() < HEADER_SIZE || &data[..4] != MAGIC {
            warn!(path = %self.path.display(), "page file has no valid header, starting empty");
            return Ok(());
        }

        let stored_size = u32::from_le_bytes(data[4..8].try_into()?) as usize;
        let length = u64::from_le_bytes(data[8..16].try_into()?) as usize;
        let payload = &data[HEADER_SIZE..];
        if payload.is_empty() && length == 0 {
            return Ok(());
        }
        // The payload must be whole pages, enough of them to hold `length` bytes.
        if stored_size == 0
            || payload.len() % stored_size != 0
            || payload.len() / stored_size < length.div_ceil(stored_size)
        {
            warn!(
                path = %self.path.display(),
                page_size = stored_size,
                length,
                available = payload.len(),
                "page file is truncated or malformed, starting empty"
            );
            return Ok(());
        }
        let page_size = stored_size;

        self.page_size = page_size;
        self.length = length;
        self.pages = payload
            .chunks(page_size)
            .map(|chunk| {
                let mut page = vec![0; page_size];
                page[..chunk.len()].copy_from_slice(chunk);
                page
            })
            .collect();
        debug!(path = %self.path.display(), pages = self.pages.len(), length, "loaded page file");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE + self.pages.len() * self.page_size);
        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&(self.page_size as u32).to_le_bytes());
        buffer.extend_from_slice(&(self.length as u64).to_le_bytes());
        for page in &self.pages {
            buffer.extend_from_slice(page);
        }
        fs::write(&self.path, buffer)?;
        Ok(())
    }
}

impl Engine for Pager {
    fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        let pages = data
            .chunks(self.page_size)
            .map(|chunk| {
                let mut page = vec![0; self.page_size];
                page[..chunk.len()].copy_from_slice(chunk);
                page
            })
            .collect();
        let previous_pages = std::mem::replace(&mut self.pages, pages);
        let previous_length = std::mem::replace(&mut self.length, data.len());
        if let Err(err) = self.flush() {
            self.pages = previous_pages;
            self.length = previous_length;
            return Err(err);
        }
        Ok(())
    }

    fn read_blob(&self) -> Option<Vec<u8>> {
        if self.pages.is_empty() || self.length == 0 {
            return None;
        }
        let mut buffer = Vec::with_capacity(self.pages.len() * self.page_size);
        for page in &self.pages {
            buffer.extend_from_slice(page);
        }
        buffer.truncate(self.length);
        Some(buffer)
    }
}
