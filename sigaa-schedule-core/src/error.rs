use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No table elements found in the document")]
    NoTablesFound,

    #[error("Row {row} of table {table} skipped: {message}")]
    RowExtraction {
        table: usize,
        row: usize,
        message: String,
    },

    #[error("Unrecognized time token: {0}")]
    UnrecognizedTimeToken(String),

    #[error("Identity table not found")]
    IdentityTableMissing,

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
