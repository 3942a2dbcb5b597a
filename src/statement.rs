use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

use futures_util::StreamExt;
use regex::Regex;
use tokio_postgres::RowStream;

use crate::error::SessionError;
use crate::query::{extract_value, statement_columns};
use crate::results::Row;
use crate::types::SqlValue;

static SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("static regex"));

/// Whether a statement is SELECT-class for the hybrid affected-rows rule.
/// Matches anywhere in the text, so `INSERT ... SELECT` counts as SELECT,
/// same as the text-sniffing drivers this mirrors.
pub(crate) fn is_select(sql: &str) -> bool {
    SELECT_RE.is_match(sql)
}

/// A prepared statement owned by the caller.
///
/// Returned by [`Session::prepare`]; re-executable any number of times via
/// [`Session::execute`]. Holding the handle (instead of a shared slot on the
/// session) means concurrent logical queries can never trample each other's
/// state.
///
/// [`Session::prepare`]: crate::Session::prepare
/// [`Session::execute`]: crate::Session::execute
#[derive(Clone)]
pub struct Statement {
    pub(crate) stmt: tokio_postgres::Statement,
    sql: Arc<String>,
    columns: Arc<Vec<String>>,
}

impl Statement {
    pub(crate) fn new(stmt: tokio_postgres::Statement, sql: Arc<String>) -> Self {
        let columns = Arc::new(statement_columns(&stmt));
        Self { stmt, sql, columns }
    }

    /// The SQL text this statement was prepared from.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    /// Column count of the statement's result shape (0 for plain DML).
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn sql_arc(&self) -> Arc<String> {
        Arc::clone(&self.sql)
    }

    pub(crate) fn columns_arc(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }
}

/// Iteration state over one execution of a [`Statement`].
///
/// Owns the driver row stream. Dropping or [`close`](Cursor::close)-ing the
/// cursor releases the server-side portal; the originating statement stays
/// re-executable.
pub struct Cursor {
    stream: Option<Pin<Box<RowStream>>>,
    sql: Arc<String>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    rows_affected: Option<u64>,
}

impl Cursor {
    pub(crate) fn new(
        stream: RowStream,
        sql: Arc<String>,
        column_names: Arc<Vec<String>>,
    ) -> Self {
        let column_index = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            stream: Some(Box::pin(stream)),
            sql,
            column_names,
            column_index,
            rows_affected: None,
        }
    }

    /// Fetch the next row, with name-keyed and positional access, or `None`
    /// once the result is exhausted.
    ///
    /// # Errors
    /// Returns the driver error if the stream fails mid-iteration; the cursor
    /// is closed in that case.
    pub async fn fetch(&mut self) -> Result<Option<Row>, SessionError> {
        let Some(driver_row) = self.next_driver_row().await? else {
            return Ok(None);
        };
        let col_count = driver_row.columns().len();
        let mut values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            values.push(extract_value(&driver_row, idx)?);
        }
        Ok(Some(Row {
            column_names: Arc::clone(&self.column_names),
            values,
            column_index: Arc::clone(&self.column_index),
        }))
    }

    /// Fetch the next row as positional values only.
    ///
    /// # Errors
    /// Same conditions as [`Cursor::fetch`].
    pub async fn fetch_values(&mut self) -> Result<Option<Vec<SqlValue>>, SessionError> {
        Ok(self.fetch().await?.map(Row::into_values))
    }

    /// Column count of the result shape.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Count the remaining rows by fetching and discarding them.
    ///
    /// This consumes the cursor: subsequent fetches return `None`. A cheap
    /// non-consuming count does not exist on a streaming cursor; callers who
    /// need the rows and the count should materialize via
    /// [`Session::run`](crate::Session::run) instead.
    ///
    /// # Errors
    /// Returns the driver error if the stream fails while draining.
    pub async fn row_count(&mut self) -> Result<usize, SessionError> {
        let mut count = 0usize;
        while self.next_driver_row().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Hybrid affected-row count.
    ///
    /// SELECT-class statements (detected by case-insensitive text sniffing,
    /// so `INSERT ... SELECT` counts as SELECT) report the first column of
    /// the next row, which callers conventionally make a count expression;
    /// anything else drains the stream and reports the driver's affected-row
    /// count.
    ///
    /// # Errors
    /// Returns `ExecutionError` when the SELECT path has no next row or its
    /// first column is not an integer, or the driver error from draining.
    pub async fn affected_rows(&mut self) -> Result<i64, SessionError> {
        if is_select(&self.sql) {
            let Some(values) = self.fetch_values().await? else {
                return Err(SessionError::ExecutionError(
                    "no row available for SELECT-class affected_rows".to_string(),
                ));
            };
            return match values.first() {
                Some(SqlValue::Int(n)) => Ok(*n),
                Some(other) => Err(SessionError::ExecutionError(format!(
                    "first column is not an integer count: {other:?}"
                ))),
                None => Err(SessionError::ExecutionError(
                    "row has no columns".to_string(),
                )),
            };
        }

        while self.next_driver_row().await?.is_some() {}
        let affected = self.rows_affected.unwrap_or(0);
        i64::try_from(affected).map_err(|e| {
            SessionError::ExecutionError(format!("invalid rows affected count: {e}"))
        })
    }

    /// Driver-reported affected-row count, available once the stream has
    /// been exhausted (by fetching to the end, [`row_count`](Cursor::row_count),
    /// or [`affected_rows`](Cursor::affected_rows)).
    #[must_use]
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// Release the row stream without draining it. Pending rows are
    /// discarded server-side; the originating statement can be executed
    /// again.
    pub fn close(&mut self) {
        self.stream = None;
    }

    async fn next_driver_row(
        &mut self,
    ) -> Result<Option<tokio_postgres::Row>, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => {
                self.stream = None;
                Err(e.into())
            }
            None => {
                self.rows_affected = stream.rows_affected();
                self.stream = None;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_select;

    #[test]
    fn select_detection_is_case_insensitive_and_positional() {
        assert!(is_select("SELECT count(*) FROM t"));
        assert!(is_select("select 1"));
        assert!(is_select("  WITH x AS (SELECT 1) SELECT * FROM x"));
        // Text sniffing, faithfully: a SELECT anywhere counts.
        assert!(is_select("INSERT INTO t SELECT * FROM s"));
        assert!(!is_select("UPDATE t SET x = 1"));
        assert!(!is_select("DELETE FROM t"));
        assert!(!is_select("selection"));
    }
}
