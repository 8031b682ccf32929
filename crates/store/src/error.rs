//! Errors raised by the embedded event store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("source not found: {0}")]
    SourceNotFound(i64),

    #[error("manual event not found: {0}")]
    ManualEventNotFound(i64),

    #[error("duplicate primary_url: {0}")]
    DuplicatePrimaryUrl(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
