use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;

/// Every page on disk is exactly this many bytes. Not configurable: there is
/// no file header to store a different value in (see SPEC_FULL.md §3).
pub const PAGE_SIZE: usize = 4096;

/// Presents the backing file as an array of fixed-size pages. Owns the file
/// exclusively; reads and writes go straight to the OS with no buffer pool
/// and no caching, so "durable" here just means "flushed".
pub struct PagedFile {
    file: File,
}

impl PagedFile {
    /// Opens `path`, creating it (and writing one zero-filled page so page 0
    /// exists) if absent.
    pub fn open(path: &Path) -> Result<Self> {
        let is_new = !path.exists();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        if is_new {
            log::debug!("creating new paged file at {}", path.display());
            file.write_all(&[0u8; PAGE_SIZE])?;
            file.flush()?;
        }

        Ok(Self { file })
    }

    /// Current page count, derived from file length.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Appends one zero-filled page and returns its page id.
    pub fn allocate_page(&mut self) -> Result<u32> {
        let page_id = self.num_pages()?;
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.flush()?;
        log::trace!("allocated page {page_id}");
        Ok(page_id)
    }

    /// Reads the full contents of page `id`.
    pub fn read_page(&mut self, id: u32) -> Result<[u8; PAGE_SIZE]> {
        self.file
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))?;
        let mut buf = [0u8; PAGE_SIZE];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrites page `id` with `bytes` and flushes.
    pub fn write_page(&mut self, id: u32, bytes: &[u8; PAGE_SIZE]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
