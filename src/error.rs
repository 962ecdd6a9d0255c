/// Error types for the cheetah client.
///
/// One error enum covers the whole application: connection setup, batch
/// execution, configuration loading, terminal input and plain I/O.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheetahError {
    /// Errors surfaced by the bundled SQLite driver
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failure to establish the initial connection (fatal at startup)
    #[error("Connection error: {0}")]
    Connection(String),

    /// A batch was rejected by the driver
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration file or flag validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Line editor errors (interrupt and EOF are handled by the session loop)
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Type alias for Result to use CheetahError as the error type.
pub type Result<T> = std::result::Result<T, CheetahError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let conn_err = CheetahError::Connection("refused".to_string());
        assert!(conn_err.to_string().contains("Connection error"));

        let exec_err = CheetahError::Execution("no such table".to_string());
        assert!(exec_err.to_string().contains("Execution error"));

        let config_err = CheetahError::Config("bad value".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CheetahError = io_err.into();
        match err {
            CheetahError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }
    }
}
