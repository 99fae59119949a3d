use std::collections::HashMap;

use crate::error::{Result, StorageError};
use crate::heap::RecordHeap;
use crate::record_id::RecordId;

const SCHEMA_TAG: &str = "SCHEMA|";

/// A table's name and ordered column list, as persisted in a schema record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    /// `SCHEMA|<table_name>|<col0>,<col1>,...` — the only serialization this
    /// engine writes or accepts; see SPEC_FULL.md §9 on the two forms found
    /// in the field.
    fn serialize(&self) -> String {
        format!("{SCHEMA_TAG}{}|{}", self.name, self.columns.join(","))
    }

    fn parse(payload: &str) -> Result<Self> {
        let rest = payload
            .strip_prefix(SCHEMA_TAG)
            .ok_or_else(|| StorageError::InvalidSchemaRecord(payload.to_string()))?;
        let mut parts = rest.splitn(2, '|');
        let name = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StorageError::InvalidSchemaRecord(payload.to_string()))?;
        let cols = parts
            .next()
            .ok_or_else(|| StorageError::InvalidSchemaRecord(payload.to_string()))?;
        let columns = cols.split(',').map(str::to_string).collect();
        Ok(Self {
            name: name.to_string(),
            columns,
        })
    }
}

/// The in-memory schema cache, kept consistent with the schema records on
/// disk by `create_table` and `drop_table`. Populated once at startup by a
/// full heap scan.
pub struct Catalog {
    tables: HashMap<String, TableSchema>,
}

impl Catalog {
    /// Scans `heap` for `SCHEMA|` records and builds the cache. Malformed
    /// schema records are skipped with a diagnostic rather than failing
    /// startup.
    pub fn load(heap: &mut RecordHeap) -> Result<Self> {
        let mut tables = HashMap::new();
        let records: Vec<Vec<u8>> = heap.iter_all().map(|(bytes, _)| bytes).collect();
        for bytes in records {
            // Check the tag at the byte level first: records are opaque
            // byte strings, and a non-schema record has no reason to be
            // valid UTF-8.
            if !bytes.starts_with(SCHEMA_TAG.as_bytes()) {
                continue;
            }
            match String::from_utf8(bytes) {
                Ok(text) => match TableSchema::parse(&text) {
                    Ok(schema) => {
                        tables.insert(schema.name.clone(), schema);
                    }
                    Err(e) => log::warn!("skipping malformed schema record: {e}"),
                },
                Err(_) => log::warn!("skipping schema record with non-utf-8 payload"),
            }
        }
        Ok(Self { tables })
    }

    /// Registers a new table. Fails if `name` is already in the cache.
    pub fn create_table(
        &mut self,
        heap: &mut RecordHeap,
        name: &str,
        columns: Vec<String>,
    ) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(StorageError::TableAlreadyExists(name.to_string()));
        }
        let schema = TableSchema {
            name: name.to_string(),
            columns,
        };
        heap.insert_record(schema.serialize().as_bytes())?;
        self.tables.insert(name.to_string(), schema);
        Ok(())
    }

    /// Removes `name`'s schema record from the heap and from the cache.
    /// Deleting the table's data records is the caller's (Table Layer's)
    /// responsibility; see `Database::drop_table`.
    pub fn drop_table(&mut self, heap: &mut RecordHeap, name: &str) -> Result<()> {
        let schema = self
            .tables
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))?;

        let target = schema.serialize();
        let hit: Option<RecordId> = heap
            .iter_all()
            .find(|(bytes, _)| bytes.as_slice() == target.as_bytes())
            .map(|(_, id)| id);

        if let Some(id) = hit {
            heap.delete_record(id)?;
        } else {
            log::warn!("drop_table({name}): schema record not found on disk, cache only");
        }

        self.tables.remove(name);
        Ok(())
    }

    /// Cache lookup. Returns `None` when the table is unknown (the spec's
    /// "empty schema" convention, made idiomatic).
    pub fn get_schema(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn column_exists(&self, name: &str, col: &str) -> bool {
        self.tables
            .get(name)
            .is_some_and(|s| s.columns.iter().any(|c| c == col))
    }
}
