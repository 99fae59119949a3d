use std::path::Path;

use crate::error::{Result, StorageError};
use crate::iterator::RecordIterator;
use crate::paged_file::{PagedFile, PAGE_SIZE};
use crate::page::SlottedPage;
use crate::record_id::RecordId;

/// Owns the paged file and turns it into a heap of variable-length byte
/// records addressed by stable `RecordId`s. Every other layer (catalog,
/// index, table) is built on top of this one and never touches `PagedFile`
/// directly.
pub struct RecordHeap {
    file: PagedFile,
}

impl RecordHeap {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            file: PagedFile::open(path)?,
        })
    }

    /// Finds the first page with room for `needed` bytes, initializing any
    /// untouched page it passes over along the way. Allocates a fresh page
    /// if no existing one fits.
    fn find_or_allocate_page(&mut self, needed: usize) -> Result<u32> {
        let num_pages = self.file.num_pages()?;
        for page_id in 0..num_pages {
            let mut buf = self.file.read_page(page_id)?;
            let mut page = SlottedPage::new(&mut buf);
            if page.is_uninitialized() {
                page.init();
            }
            if page.available() >= needed {
                self.file.write_page(page_id, &buf)?;
                return Ok(page_id);
            }
        }

        let page_id = self.file.allocate_page()?;
        let mut buf = [0u8; PAGE_SIZE];
        SlottedPage::new(&mut buf).init();
        self.file.write_page(page_id, &buf)?;
        Ok(page_id)
    }

    /// Inserts `payload` using first-fit page selection, returning the
    /// record's new stable id.
    pub fn insert_record(&mut self, payload: &[u8]) -> Result<RecordId> {
        let needed = 4 /* slot directory entry */ + payload.len();
        let page_id = self.find_or_allocate_page(needed)?;

        let mut buf = self.file.read_page(page_id)?;
        let mut page = SlottedPage::new(&mut buf);
        let slot = page.insert(payload)?;
        self.file.write_page(page_id, &buf)?;

        let id = RecordId::new(page_id as u16, slot);
        log::trace!("inserted record {id:?} ({} bytes)", payload.len());
        Ok(id)
    }

    /// Reads the page `id` lives on, or `RecordNotFound` when `id.page` is
    /// past the end of the file. A page index that simply doesn't exist is
    /// a logical "not there", not an I/O fault — callers (the host can pass
    /// any record id) must be able to distinguish the two per §7.
    fn read_record_page(&mut self, id: RecordId) -> Result<[u8; PAGE_SIZE]> {
        if id.page as u32 >= self.file.num_pages()? {
            return Err(StorageError::RecordNotFound(id));
        }
        self.file.read_page(id.page as u32)
    }

    /// Reads the live payload at `id`.
    pub fn get_record(&mut self, id: RecordId) -> Result<Vec<u8>> {
        let mut buf = self.read_record_page(id)?;
        let page = SlottedPage::new(&mut buf);
        page.get(id.slot)
            .map(|bytes| bytes.to_vec())
            .map_err(|_| StorageError::RecordNotFound(id))
    }

    /// Tombstones `id`'s slot. The slot itself is never reclaimed or reused,
    /// so the id stays permanently invalid afterward. Deleting an already
    /// deleted record is a no-op, not an error.
    pub fn delete_record(&mut self, id: RecordId) -> Result<()> {
        let mut buf = self.read_record_page(id)?;
        let mut page = SlottedPage::new(&mut buf);
        if page.is_tombstoned(id.slot) {
            log::warn!("delete_record: {id:?} already tombstoned");
            return Ok(());
        }
        page.tombstone(id.slot);
        self.file.write_page(id.page as u32, &buf)?;
        Ok(())
    }

    /// Updates `id`'s payload in place when it fits within the slot's
    /// original capacity; otherwise tombstones the old slot and reinserts
    /// elsewhere, returning the new id. Callers that index by `RecordId`
    /// must re-check the returned id against the one they passed in.
    pub fn update_record(&mut self, id: RecordId, new_payload: &[u8]) -> Result<RecordId> {
        let mut buf = self.read_record_page(id)?;
        let mut page = SlottedPage::new(&mut buf);

        if page.is_tombstoned(id.slot) {
            return Err(StorageError::RecordNotFound(id));
        }

        if new_payload.len() as u16 <= page.slot_capacity(id.slot) {
            page.update_in_place(id.slot, new_payload)?;
            self.file.write_page(id.page as u32, &buf)?;
            return Ok(id);
        }

        page.tombstone(id.slot);
        self.file.write_page(id.page as u32, &buf)?;
        let new_id = self.insert_record(new_payload)?;
        log::trace!("update_record: relocated {id:?} -> {new_id:?}");
        Ok(new_id)
    }

    /// A forward, single-pass iterator over every live record in the heap.
    pub fn iter_all(&mut self) -> RecordIterator<'_> {
        RecordIterator::new(&mut self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn fresh_heap() -> (RecordHeap, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::remove_file(tmp.path()).unwrap();
        let heap = RecordHeap::open(tmp.path()).unwrap();
        (heap, tmp)
    }

    #[test]
    fn insert_then_get_round_trips() {
        let (mut heap, _tmp) = fresh_heap();
        let id = heap.insert_record(b"hello world").unwrap();
        assert_eq!(heap.get_record(id).unwrap(), b"hello world");
    }

    #[test]
    fn get_record_with_out_of_range_page_is_not_found_not_io_error() {
        let (mut heap, _tmp) = fresh_heap();
        let bogus = RecordId::new(999, 0);
        match heap.get_record(bogus) {
            Err(StorageError::RecordNotFound(id)) => assert_eq!(id, bogus),
            other => panic!("expected RecordNotFound, got {other:?}"),
        }
    }

    #[test]
    fn delete_then_get_fails() {
        let (mut heap, _tmp) = fresh_heap();
        let id = heap.insert_record(b"bye").unwrap();
        heap.delete_record(id).unwrap();
        assert!(heap.get_record(id).is_err());
    }

    #[test]
    fn deleting_twice_is_not_an_error() {
        let (mut heap, _tmp) = fresh_heap();
        let id = heap.insert_record(b"bye").unwrap();
        heap.delete_record(id).unwrap();
        heap.delete_record(id).unwrap();
    }

    #[test]
    fn update_in_place_keeps_same_id() {
        let (mut heap, _tmp) = fresh_heap();
        let id = heap.insert_record(b"AAAAAAAAAA").unwrap();
        let new_id = heap.update_record(id, b"BB").unwrap();
        assert_eq!(id, new_id);
        assert_eq!(heap.get_record(id).unwrap(), b"BB");
    }

    #[test]
    fn update_that_grows_relocates_and_tombstones_original() {
        let (mut heap, _tmp) = fresh_heap();
        let id = heap.insert_record(b"AA").unwrap();
        let new_id = heap.update_record(id, b"AAAAAAAAAAAAAAAA").unwrap();
        assert_ne!(id, new_id);
        assert!(heap.get_record(id).is_err());
        assert_eq!(heap.get_record(new_id).unwrap(), b"AAAAAAAAAAAAAAAA");
    }

    #[test]
    fn first_fit_reuses_space_freed_by_a_tombstone() {
        let (mut heap, _tmp) = fresh_heap();
        let payload = vec![b'x'; 1000];
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(heap.insert_record(&payload).unwrap());
        }
        assert_eq!(heap.file.num_pages().unwrap(), 1);

        heap.delete_record(ids[0]).unwrap();
        let before_pages = heap.file.num_pages().unwrap();
        // Tombstoned space is not reclaimed, so this still needs a new page.
        heap.insert_record(&payload).unwrap();
        assert!(heap.file.num_pages().unwrap() >= before_pages);
    }

    #[test]
    fn allocates_additional_pages_once_one_is_full() {
        let (mut heap, _tmp) = fresh_heap();
        let payload = vec![b'x'; 1000];
        for _ in 0..8 {
            heap.insert_record(&payload).unwrap();
        }
        assert!(heap.file.num_pages().unwrap() > 1);
    }
}
