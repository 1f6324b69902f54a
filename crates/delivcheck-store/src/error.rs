use delivcheck_core::ParseStatusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("corrupt status row: {0}")]
    Status(#[from] ParseStatusError),

    #[error("store connection lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Other(String),
}
