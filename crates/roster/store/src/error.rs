use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Table-store errors.
///
/// `OutOfRange` and `UnknownIndex` indicate data-integrity bugs or
/// misconfiguration and should never surface from normal operation.
/// Corrupt persisted documents are recovered internally by [`TableStore::load`]
/// (reset to empty) and never produce an error.
///
/// [`TableStore::load`]: crate::TableStore::load
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such id {id} in table \"{table}\" (size {size})")]
    OutOfRange {
        table: String,
        id: usize,
        size: usize,
    },

    #[error("no such column index \"{column}\" for table \"{table}\"")]
    UnknownIndex { table: String, column: String },

    #[error("no such table \"{0}\"")]
    UnknownTable(String),

    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
