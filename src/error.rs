use thiserror::Error;

use crate::core::item::RecordError;

#[derive(Error, Debug)]
/// Error raised while processing a CSV stream
pub enum CsvError {
    #[error("StreamRead from: {0}")]
    StreamRead(String),

    #[error("Header validation failed: [{}]", .0.join(", "))]
    HeaderValidation(Vec<String>),

    #[error("Field '{column}' has an invalid validation pattern: {reason}")]
    InvalidPattern { column: String, reason: String },

    #[error("Configuration from: {0}")]
    Configuration(String),

    #[error("WorkerPool from: {0}")]
    WorkerPool(String),

    #[error("{0}")]
    RecordMapping(String),

    #[error("{0}")]
    Handler(String),

    #[error("{}", .0.error_message)]
    RecordFailed(RecordError),
}

impl From<std::io::Error> for CsvError {
    fn from(error: std::io::Error) -> Self {
        CsvError::StreamRead(error.to_string())
    }
}
