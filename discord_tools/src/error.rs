use thiserror::Error;

/// Discord's JSON error code for "A tag is required to create a forum post in this channel".
pub const TAG_REQUIRED_ERROR_CODE: u64 = 40067;
/// Discord's JSON error code for "Unknown Channel".
pub const UNKNOWN_CHANNEL_ERROR_CODE: u64 = 10003;

#[derive(Debug, Error)]
pub enum DiscordApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, code: Option<u64>, message: String },
}

impl DiscordApiError {
    /// The Discord JSON error code, if the API returned one.
    pub fn error_code(&self) -> Option<u64> {
        match self {
            Self::QueryError { code, .. } => *code,
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::QueryError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
