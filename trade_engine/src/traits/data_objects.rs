use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeDbError {
    #[error("Database error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Schema migration failed: {0}")]
    Migration(String),
    #[error("Invalid input: {0}")]
    Validation(String),
}
