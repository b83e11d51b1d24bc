use thiserror::Error;

use super::task::Table;

/// Errors produced by the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with `id` in `table` (or the table does not exist yet)
    #[error("{table}: no record with id {id}")]
    NotFound { table: Table, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// The database file does not exist yet
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
