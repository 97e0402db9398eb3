use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::LocationKey;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Query and construction failures of the series store and date index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("Unknown location: `{0}`")]
    KeyNotFound(LocationKey),

    #[error("Date {0} is not part of the report index")]
    DateNotFound(NaiveDate),

    #[error("Position {position} is outside the report index ({len} dates)")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("No population on record for `{0}`")]
    PopulationMissing(LocationKey),
}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        AppError::new(4, err.to_string())
    }
}
