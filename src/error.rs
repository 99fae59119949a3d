use crate::record_id::RecordId;

/// The error type shared by every layer of the engine, from the paged file
/// up through the table layer. Logical failures (not found, bad arity, ...)
/// are returned as ordinary `Err` values, never panics; see `StorageError`
/// variant docs for which layer raises which kind.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} does not have enough free space for a record of {needed} bytes")]
    OutOfSpace { page: u32, needed: usize },

    #[error("record {0:?} not found")]
    RecordNotFound(RecordId),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("expected {expected} values for table '{table}', got {got}")]
    ArityMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    #[error("malformed record identifier: {0}")]
    InvalidRecordId(String),

    #[error("malformed schema record: {0}")]
    InvalidSchemaRecord(String),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
