use crate::error::StorageError;

/// A stable handle to a record's slot: which page it lives on and which
/// slot within that page's directory. Encoded to a single `u32` at the
/// boundary (catalog/index/table layers only ever pass the encoded form
/// around); decoded back to this struct wherever a page/slot pair is
/// actually needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page: u16,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page: u16, slot: u16) -> Self {
        Self { page, slot }
    }

    pub fn encode(self) -> u32 {
        ((self.page as u32) << 16) | (self.slot as u32)
    }

    pub fn decode(encoded: u32) -> Self {
        Self {
            page: (encoded >> 16) as u16,
            slot: (encoded & 0xFFFF) as u16,
        }
    }

    /// Parses a record id from the `-1`-means-"all rows" convention used at
    /// the host boundary (see `TableManager::delete_from`).
    pub fn decode_signed(raw: i64) -> crate::error::Result<Option<Self>> {
        if raw < 0 {
            return Ok(None);
        }
        if raw > u32::MAX as i64 {
            return Err(StorageError::InvalidRecordId(format!(
                "record id {raw} out of range"
            )));
        }
        Ok(Some(Self::decode(raw as u32)))
    }
}
