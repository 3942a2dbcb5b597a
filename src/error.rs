use thiserror::Error;

/// Error type for all fallible session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Empty query string")]
    EmptyQuery,

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unrecognized transaction command: {0:?}")]
    UnknownTransactionCommand(String),
}

/// Driver error details recorded on the session after a failed operation.
///
/// Mirrors what the server reports: the SQLSTATE code, the primary message,
/// and the optional detail line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Five-character SQLSTATE code, when the server reported one.
    pub sqlstate: Option<String>,
    /// Primary human-readable message.
    pub message: String,
    /// Optional secondary detail from the server.
    pub detail: Option<String>,
}

impl ErrorInfo {
    pub(crate) fn from_driver(err: &tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            ErrorInfo {
                sqlstate: Some(db_err.code().code().to_string()),
                message: db_err.message().to_string(),
                detail: db_err.detail().map(ToString::to_string),
            }
        } else {
            ErrorInfo {
                sqlstate: err.code().map(|c| c.code().to_string()),
                message: err.to_string(),
                detail: None,
            }
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sqlstate {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
