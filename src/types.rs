use std::str::FromStr;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SessionError;

/// Values that can be fetched from a database row or bound as query parameters.
///
/// One enum covers both directions so helper code never has to branch on
/// driver types:
/// ```rust
/// use pg_session::SqlValue;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let SqlValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        if let SqlValue::JSON(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// A transaction-control keyword accepted by [`Session::transaction`].
///
/// Parsing is case-insensitive and tolerates surrounding whitespace.
///
/// [`Session::transaction`]: crate::Session::transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionCommand {
    /// `BEGIN`, `START`, or `START TRANSACTION`
    Begin,
    /// `COMMIT` or `END`
    Commit,
    /// `ROLLBACK`
    Rollback,
}

impl TransactionCommand {
    /// The SQL statement issued for this command.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            TransactionCommand::Begin => "BEGIN",
            TransactionCommand::Commit => "COMMIT",
            TransactionCommand::Rollback => "ROLLBACK",
        }
    }
}

impl FromStr for TransactionCommand {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "START" | "START TRANSACTION" | "BEGIN" => Ok(TransactionCommand::Begin),
            "END" | "COMMIT" => Ok(TransactionCommand::Commit),
            "ROLLBACK" => Ok(TransactionCommand::Rollback),
            _ => Err(SessionError::UnknownTransactionCommand(s.to_string())),
        }
    }
}

/// A query and its bound parameters as recorded in the session log.
///
/// One record is appended per [`Session::run`] call, before the query is
/// handed to the driver, so the log reflects attempts rather than successes.
///
/// [`Session::run`]: crate::Session::run
#[derive(Debug, Clone)]
pub struct QueryRecord {
    /// The SQL query string
    pub query: String,
    /// The parameters bound to the query (empty when none were supplied)
    pub params: Vec<SqlValue>,
}

impl QueryRecord {
    pub(crate) fn new(query: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}
