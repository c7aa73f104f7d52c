use thiserror::Error;

use crate::{flow_api::Reply, traits::TradeDbError};

/// An unrecoverable orchestrator failure. Everything the caller can act on is reported in the reply instead.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Database error: {0}")]
    DatabaseError(TradeDbError),
}

impl From<TradeDbError> for FlowError {
    fn from(e: TradeDbError) -> Self {
        Self::DatabaseError(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The title cannot be empty.")]
    EmptyTitle,
    #[error("The title can be at most {max} characters long.")]
    TitleTooLong { max: usize },
    #[error("The price must be a whole number of at least 1 aUEC, not {0}.")]
    InvalidPrice(i64),
    #[error("The stock must be at least 1, not {0}.")]
    InvalidStock(i64),
    #[error("The amount must be at least 1, not {0}.")]
    InvalidAmount(i64),
    #[error("The discount must be between 0 and 95 percent, not {0}.")]
    InvalidDiscount(i64),
}

/// The two ways a single-record transition can stop early. Rejections become reply text; fatal errors propagate.
#[derive(Debug)]
pub(crate) enum Halt {
    Rejected(String),
    Fatal(FlowError),
}

impl Halt {
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected(message.into())
    }
}

impl From<TradeDbError> for Halt {
    fn from(e: TradeDbError) -> Self {
        match e {
            TradeDbError::Validation(message) => Self::Rejected(message),
            e => Self::Fatal(FlowError::from(e)),
        }
    }
}

impl From<ValidationError> for Halt {
    fn from(e: ValidationError) -> Self {
        Self::Rejected(e.to_string())
    }
}

impl From<FlowError> for Halt {
    fn from(e: FlowError) -> Self {
        Self::Fatal(e)
    }
}

/// Turns the outcome of a single transition into what the caller sees. Only fatal errors escape.
pub(crate) fn settle(result: Result<Reply, Halt>) -> Result<Reply, FlowError> {
    match result {
        Ok(reply) => Ok(reply),
        Err(Halt::Rejected(message)) => Ok(Reply::new(message)),
        Err(Halt::Fatal(e)) => Err(e),
    }
}
