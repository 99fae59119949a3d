use std::path::Path;

use crate::catalog::{Catalog, TableSchema};
use crate::error::Result;
use crate::heap::RecordHeap;
use crate::index::IndexManager;
use crate::iterator::RecordIterator;
use crate::record_id::RecordId;
use crate::table::TableManager;

/// The single entry point into the storage engine: opens one file and
/// composes the Record Heap, Catalog, and Index Layer behind the Table
/// Layer's operations. There is no SQL surface here — callers pass already
/// parsed table names, columns, and values.
pub struct Database {
    heap: RecordHeap,
    catalog: Catalog,
    index: IndexManager,
}

impl Database {
    /// Opens (or creates) the backing file at `path` and hydrates the
    /// schema cache from it.
    pub fn open(path: &Path) -> Result<Self> {
        let mut heap = RecordHeap::open(path)?;
        let catalog = Catalog::load(&mut heap)?;
        log::info!(
            "opened database at {} ({} table(s) loaded)",
            path.display(),
            catalog.list_tables().len()
        );
        Ok(Self {
            heap,
            catalog,
            index: IndexManager::new(),
        })
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        self.catalog.create_table(&mut self.heap, name, columns)
    }

    /// Drops the schema and wipes every data record tagged for `name`.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        TableManager::delete_from(&mut self.heap, &self.catalog, &mut self.index, name, None)?;
        self.catalog.drop_table(&mut self.heap, name)
    }

    pub fn get_schema(&self, name: &str) -> Option<&TableSchema> {
        self.catalog.get_schema(name)
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.catalog.list_tables()
    }

    pub fn insert_into(&mut self, table: &str, values: Vec<String>) -> Result<RecordId> {
        TableManager::insert_into(&mut self.heap, &self.catalog, &mut self.index, table, values)
    }

    pub fn delete_from(&mut self, table: &str, rid: Option<RecordId>) -> Result<()> {
        TableManager::delete_from(&mut self.heap, &self.catalog, &mut self.index, table, rid)
    }

    pub fn update(
        &mut self,
        table: &str,
        rid: RecordId,
        new_values: Vec<String>,
    ) -> Result<RecordId> {
        TableManager::update(&mut self.heap, &self.catalog, &mut self.index, table, rid, new_values)
    }

    pub fn select(&mut self, rid: RecordId) -> Result<Vec<u8>> {
        TableManager::select(&mut self.heap, rid)
    }

    pub fn scan(&mut self, table: &str) -> Vec<Vec<u8>> {
        TableManager::scan(&mut self.heap, table)
    }

    pub fn create_index(&mut self, table: &str, col: &str) {
        self.index.create_index(table, col);
    }

    pub fn drop_index(&mut self, table: &str, col: &str) {
        self.index.drop_index(table, col);
    }

    pub fn search(&self, table: &str, col: &str, value: &str) -> Vec<RecordId> {
        self.index.search(table, col, value)
    }

    pub fn range_search(&self, table: &str, col: &str, lo: &str, hi: &str) -> Vec<RecordId> {
        self.index.range_search(table, col, lo, hi)
    }

    /// Exposes the raw record iterator for callers that need every payload
    /// in the file, schema records included (the Catalog uses this at
    /// load time).
    pub fn iter_records(&mut self) -> RecordIterator<'_> {
        self.heap.iter_all()
    }
}
