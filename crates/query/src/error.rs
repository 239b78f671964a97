//! Event store error types

/// Errors that can occur while reading from an event store
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// Query execution failed
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Event record could not be decoded
    #[error("invalid event on line {line}: {message}")]
    InvalidEvent {
        /// 1-based line number in the source file
        line: usize,
        /// Decoder message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl QueryError {
    /// Create an InvalidEvent error
    pub fn invalid_event(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            line,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Serialization(err.to_string())
    }
}

/// Result type for event store operations
pub type Result<T> = std::result::Result<T, QueryError>;
