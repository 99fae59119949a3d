use crate::catalog::Catalog;
use crate::error::{Result, StorageError};
use crate::heap::RecordHeap;
use crate::index::IndexManager;
use crate::record_id::RecordId;

/// Composes Record Heap, Catalog, and Index Layer to enforce schema arity
/// on mutation and keep indexes in sync with the heap. This is the only
/// layer that understands the `<table>|v0|v1|...` tagging convention.
pub struct TableManager;

impl TableManager {
    /// Builds `<table>|v0|v1|...` at the byte level — values are opaque
    /// byte strings, not necessarily valid UTF-8 once other tables' records
    /// share the heap.
    fn tag(table: &str, values: &[String]) -> Vec<u8> {
        let mut buf = Vec::from(table.as_bytes());
        for v in values {
            buf.push(b'|');
            buf.extend_from_slice(v.as_bytes());
        }
        buf
    }

    /// Splits a tagged data record into its table name and values, on the
    /// raw `|` byte. Returns `None` for schema records or anything else
    /// without a recognizable `<table>|...` shape. Never requires the
    /// payload to be valid UTF-8.
    fn untag(payload: &[u8]) -> Option<(&[u8], Vec<&[u8]>)> {
        if payload.starts_with(b"SCHEMA|") {
            return None;
        }
        let mut parts = payload.split(|&b| b == b'|');
        let table = parts.next()?;
        Some((table, parts.collect()))
    }

    fn unindex(index: &mut IndexManager, columns: &[String], table: &str, values: &[&[u8]], id: RecordId) {
        for (col, val) in columns.iter().zip(values.iter()) {
            let val = String::from_utf8_lossy(val);
            index.delete_entry(table, col, &val, id);
        }
    }

    fn schema_for<'c>(catalog: &'c Catalog, table: &str) -> Result<&'c crate::catalog::TableSchema> {
        catalog
            .get_schema(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    /// Serializes `values` as `<table>|v0|v1|...`, inserts into the heap,
    /// and indexes every column that has a registered index. Fails on
    /// arity mismatch against the table's schema.
    pub fn insert_into(
        heap: &mut RecordHeap,
        catalog: &Catalog,
        index: &mut IndexManager,
        table: &str,
        values: Vec<String>,
    ) -> Result<RecordId> {
        let schema = Self::schema_for(catalog, table)?;
        if values.len() != schema.columns.len() {
            return Err(StorageError::ArityMismatch {
                table: table.to_string(),
                expected: schema.columns.len(),
                got: values.len(),
            });
        }

        let payload = Self::tag(table, &values);
        let id = heap.insert_record(&payload)?;

        for (col, val) in schema.columns.iter().zip(values.iter()) {
            index.insert_entry(table, col, val, id);
        }
        Ok(id)
    }

    /// `rid = None` deletes every live record tagged for `table`; this
    /// collects ids in a first pass (via the iterator) and deletes them in
    /// a second, because mutating the heap mid-iteration invalidates the
    /// iterator. `Some(rid)` deletes just that record.
    pub fn delete_from(
        heap: &mut RecordHeap,
        catalog: &Catalog,
        index: &mut IndexManager,
        table: &str,
        rid: Option<RecordId>,
    ) -> Result<()> {
        let schema = Self::schema_for(catalog, table)?;

        match rid {
            Some(id) => {
                let payload = heap.get_record(id)?;
                if let Some((t, values)) = Self::untag(&payload) {
                    if t == table.as_bytes() {
                        Self::unindex(index, &schema.columns, table, &values, id);
                    }
                }
                heap.delete_record(id)?;
            }
            None => {
                let prefix = format!("{table}|");
                let prefix = prefix.as_bytes();
                let matches: Vec<(RecordId, Vec<u8>)> = heap
                    .iter_all()
                    .filter(|(bytes, _)| bytes.starts_with(prefix))
                    .map(|(bytes, id)| (id, bytes))
                    .collect();

                for (id, bytes) in matches {
                    if let Some((_, values)) = Self::untag(&bytes) {
                        Self::unindex(index, &schema.columns, table, &values, id);
                    }
                    heap.delete_record(id)?;
                }
            }
        }
        Ok(())
    }

    /// Removes the old indexed values, updates the heap (in place or via
    /// relocation), then re-indexes the new values against whichever id
    /// `update_record` returns — the specified behavior when a grown
    /// update relocates the record.
    pub fn update(
        heap: &mut RecordHeap,
        catalog: &Catalog,
        index: &mut IndexManager,
        table: &str,
        rid: RecordId,
        new_values: Vec<String>,
    ) -> Result<RecordId> {
        let schema = Self::schema_for(catalog, table)?;
        if new_values.len() != schema.columns.len() {
            return Err(StorageError::ArityMismatch {
                table: table.to_string(),
                expected: schema.columns.len(),
                got: new_values.len(),
            });
        }

        let old_payload = heap.get_record(rid)?;
        if let Some((_, old_values)) = Self::untag(&old_payload) {
            Self::unindex(index, &schema.columns, table, &old_values, rid);
        }

        let new_payload = Self::tag(table, &new_values);
        let new_id = heap.update_record(rid, &new_payload)?;

        for (col, val) in schema.columns.iter().zip(new_values.iter()) {
            index.insert_entry(table, col, val, new_id);
        }
        Ok(new_id)
    }

    pub fn select(heap: &mut RecordHeap, rid: RecordId) -> Result<Vec<u8>> {
        heap.get_record(rid)
    }

    /// Every live record tagged for `table`, with the `<table>|` prefix
    /// stripped. Works on raw bytes throughout: a value is an opaque byte
    /// string and need not be valid UTF-8.
    pub fn scan(heap: &mut RecordHeap, table: &str) -> Vec<Vec<u8>> {
        let prefix = format!("{table}|");
        let prefix = prefix.as_bytes();
        heap.iter_all()
            .filter_map(|(bytes, _)| {
                bytes.starts_with(prefix).then(|| bytes[prefix.len()..].to_vec())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    struct Fixture {
        heap: RecordHeap,
        catalog: Catalog,
        index: IndexManager,
        _tmp: NamedTempFile,
    }

    fn fixture_with_table(table: &str, cols: &[&str]) -> Fixture {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::remove_file(tmp.path()).unwrap();
        let mut heap = RecordHeap::open(tmp.path()).unwrap();
        let mut catalog = Catalog::load(&mut heap).unwrap();
        catalog
            .create_table(&mut heap, table, cols.iter().map(|s| s.to_string()).collect())
            .unwrap();
        Fixture {
            heap,
            catalog,
            index: IndexManager::new(),
            _tmp: tmp,
        }
    }

    #[test]
    fn insert_then_select_and_scan() {
        let mut f = fixture_with_table("users", &["id", "name"]);
        let rid = TableManager::insert_into(
            &mut f.heap,
            &f.catalog,
            &mut f.index,
            "users",
            vec!["1".into(), "Alice".into()],
        )
        .unwrap();

        let record = TableManager::select(&mut f.heap, rid).unwrap();
        assert_eq!(record, b"users|1|Alice");

        let rows = TableManager::scan(&mut f.heap, "users");
        assert_eq!(rows, vec![b"1|Alice".to_vec()]);
    }

    #[test]
    fn insert_with_wrong_arity_fails() {
        let mut f = fixture_with_table("users", &["id", "name"]);
        let err = TableManager::insert_into(
            &mut f.heap,
            &f.catalog,
            &mut f.index,
            "users",
            vec!["1".into()],
        );
        assert!(err.is_err());
    }

    #[test]
    fn delete_by_id_removes_record() {
        let mut f = fixture_with_table("users", &["id", "name"]);
        let rid = TableManager::insert_into(
            &mut f.heap,
            &f.catalog,
            &mut f.index,
            "users",
            vec!["1".into(), "Alice".into()],
        )
        .unwrap();

        TableManager::delete_from(&mut f.heap, &f.catalog, &mut f.index, "users", Some(rid))
            .unwrap();
        assert!(TableManager::select(&mut f.heap, rid).is_err());
        assert!(TableManager::scan(&mut f.heap, "users").is_empty());
    }

    #[test]
    fn delete_all_removes_only_target_table_rows() {
        let mut f = fixture_with_table("t", &["a"]);
        f.catalog
            .create_table(&mut f.heap, "u", vec!["b".into()])
            .unwrap();

        for v in ["x", "y", "z"] {
            TableManager::insert_into(&mut f.heap, &f.catalog, &mut f.index, "t", vec![v.into()])
                .unwrap();
        }
        TableManager::insert_into(&mut f.heap, &f.catalog, &mut f.index, "u", vec!["keep".into()])
            .unwrap();

        TableManager::delete_from(&mut f.heap, &f.catalog, &mut f.index, "t", None).unwrap();

        assert!(TableManager::scan(&mut f.heap, "t").is_empty());
        assert_eq!(TableManager::scan(&mut f.heap, "u"), vec![b"keep".to_vec()]);
    }

    #[test]
    fn update_shrinking_keeps_id_and_reindexes() {
        let mut f = fixture_with_table("t", &["a"]);
        f.index.create_index("t", "a");
        let rid = TableManager::insert_into(
            &mut f.heap,
            &f.catalog,
            &mut f.index,
            "t",
            vec!["AAAAAAAAAA".into()],
        )
        .unwrap();
        f.index.insert_entry("t", "a", "AAAAAAAAAA", rid);

        let new_id =
            TableManager::update(&mut f.heap, &f.catalog, &mut f.index, "t", rid, vec!["BB".into()])
                .unwrap();
        assert_eq!(new_id, rid);
        assert!(f.index.search("t", "a", "AAAAAAAAAA").is_empty());
        assert_eq!(f.index.search("t", "a", "BB"), vec![rid]);
    }

    #[test]
    fn update_growing_relocates_and_reindexes_new_id() {
        let mut f = fixture_with_table("t", &["a"]);
        f.index.create_index("t", "a");
        let rid = TableManager::insert_into(&mut f.heap, &f.catalog, &mut f.index, "t", vec!["AA".into()])
            .unwrap();
        f.index.insert_entry("t", "a", "AA", rid);

        let big = "C".repeat(64);
        let new_id = TableManager::update(
            &mut f.heap,
            &f.catalog,
            &mut f.index,
            "t",
            rid,
            vec![big.clone()],
        )
        .unwrap();

        assert_ne!(new_id, rid);
        assert!(f.index.search("t", "a", "AA").is_empty());
        assert_eq!(f.index.search("t", "a", &big), vec![new_id]);
        assert!(TableManager::select(&mut f.heap, rid).is_err());
    }

    #[test]
    fn scan_and_delete_all_handle_non_utf8_values() {
        let mut f = fixture_with_table("t", &["a"]);
        // Bypass insert_into to plant a record whose value is not valid
        // UTF-8 — values are opaque byte strings, so scan/delete_from must
        // not require the whole payload to decode as text.
        let mut payload = b"t|".to_vec();
        payload.extend_from_slice(&[0xFF, 0xFE, b'x']);
        f.heap.insert_record(&payload).unwrap();

        let rows = TableManager::scan(&mut f.heap, "t");
        assert_eq!(rows, vec![vec![0xFF, 0xFE, b'x']]);

        TableManager::delete_from(&mut f.heap, &f.catalog, &mut f.index, "t", None).unwrap();
        assert!(TableManager::scan(&mut f.heap, "t").is_empty());
    }
}
