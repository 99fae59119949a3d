use crate::paged_file::{PagedFile, PAGE_SIZE};
use crate::page::SlottedPage;
use crate::record_id::RecordId;

/// A forward, single-pass cursor over every live record in the file, in
/// (page ascending, slot ascending) order. Holds the current page's image
/// only — it is not a cursor into the heap itself, so mutating the heap
/// through `RecordHeap` while an iterator built from it is alive is a
/// compile error (the iterator holds the paged file borrowed exclusively),
/// not just a documented hazard.
pub struct RecordIterator<'a> {
    file: &'a mut PagedFile,
    current_page: u32,
    current_slot: u16,
    current_buf: Option<[u8; PAGE_SIZE]>,
}

impl<'a> RecordIterator<'a> {
    pub(crate) fn new(file: &'a mut PagedFile) -> Self {
        let current_buf = file.read_page(0).ok();
        Self {
            file,
            current_page: 0,
            current_slot: 0,
            current_buf,
        }
    }
}

impl<'a> Iterator for RecordIterator<'a> {
    type Item = (Vec<u8>, RecordId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.current_buf.as_ref()?;

            let slot_count = {
                let buf = self.current_buf.as_mut().unwrap();
                SlottedPage::new(buf).slot_count()
            };

            if self.current_slot >= slot_count {
                self.current_page += 1;
                self.current_slot = 0;
                match self.file.read_page(self.current_page) {
                    Ok(next_buf) => {
                        self.current_buf = Some(next_buf);
                        continue;
                    }
                    Err(_) => {
                        // No more pages: the normal end-of-stream signal.
                        self.current_buf = None;
                        return None;
                    }
                }
            }

            let slot = self.current_slot;
            self.current_slot += 1;

            let buf = self.current_buf.as_mut().unwrap();
            let page = SlottedPage::new(buf);
            if page.is_tombstoned(slot) {
                continue;
            }
            let payload = page
                .get(slot)
                .expect("non-tombstoned slot must be readable")
                .to_vec();
            return Some((payload, RecordId::new(self.current_page as u16, slot)));
        }
    }
}
