use std::sync::Arc;

use futures_util::StreamExt;
use tokio_postgres::{Client, NoTls, RowStream};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{ErrorInfo, SessionError};
use crate::params::{Params, slice_iter};
use crate::query::{build_result_set_from_rows, build_result_set_from_statement};
use crate::results::ResultSet;
use crate::statement::{Cursor, Statement};
use crate::types::{QueryRecord, SqlValue, TransactionCommand};

/// One live database connection with a query counter, a query log, and the
/// most recent driver error.
///
/// Construct with [`Session::connect`]; tear down with [`Session::close`].
/// Operations take `&mut self`, so a session cannot be shared between tasks —
/// use one session per task when concurrency is needed.
///
/// ```no_run
/// use pg_session::{Session, SessionConfig, SqlValue};
///
/// # async fn demo() -> Result<(), pg_session::SessionError> {
/// let cfg = SessionConfig::new("appdb", "app", "s3cret");
/// let mut session = Session::connect(&cfg).await?;
///
/// let rs = session
///     .run("SELECT id, name FROM users WHERE id = $1", &[SqlValue::Int(1)])
///     .await?;
/// if let Some(row) = rs.rows.first() {
///     println!("name = {:?}", row.get("name"));
/// }
///
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    client: Client,
    driver: tokio::task::JoinHandle<()>,
    total_queries: u64,
    query_log: Vec<QueryRecord>,
    last_error: Option<ErrorInfo>,
}

impl Session {
    /// Connect to the server described by `config`.
    ///
    /// The driver's connection future is spawned as a background task; it
    /// terminates when the session is closed or dropped.
    ///
    /// # Errors
    /// `ConfigError` when required config fields are missing;
    /// `ConnectionError` (carrying the driver's message and SQLSTATE when
    /// present) when the connection attempt fails. No other error type is
    /// surfaced at construction.
    pub async fn connect(config: &SessionConfig) -> Result<Session, SessionError> {
        let conn_str = config.connection_string()?;
        let pg_config: tokio_postgres::Config = conn_str
            .parse()
            .map_err(|e: tokio_postgres::Error| SessionError::ConnectionError(e.to_string()))?;

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| SessionError::ConnectionError(ErrorInfo::from_driver(&e).to_string()))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("connection driver exited with error: {e}");
            }
        });

        debug!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "session connected"
        );

        Ok(Session {
            client,
            driver,
            total_queries: 0,
            query_log: Vec::new(),
            last_error: None,
        })
    }

    /// Run a query and materialize the full result set.
    ///
    /// Increments the query counter and appends a [`QueryRecord`] before
    /// execution, so the counter and log reflect every attempt. Without
    /// parameters the text is executed directly; with parameters it is
    /// prepared and executed with bound values. Both paths return the same
    /// row shape.
    ///
    /// The returned [`ResultSet::rows_affected`] carries the driver-reported
    /// count, so DML run through here still reports how many rows it touched.
    ///
    /// # Errors
    /// `EmptyQuery` for an empty query string (counter and log untouched);
    /// otherwise driver errors from preparation or execution, which are also
    /// recorded on the session for [`Session::last_error`].
    pub async fn run(
        &mut self,
        query: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SessionError> {
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        self.total_queries += 1;
        self.query_log.push(QueryRecord::new(query, params.to_vec()));
        debug!(total_queries = self.total_queries, query, "run");

        let converted = Params::convert(params)?;
        if params.is_empty() {
            let stream = match self.client.query_raw(query, slice_iter(converted.as_refs())).await
            {
                Ok(stream) => stream,
                Err(e) => return Err(self.note_error(e)),
            };
            self.collect(stream, None).await
        } else {
            let stmt = match self.client.prepare(query).await {
                Ok(stmt) => stmt,
                Err(e) => return Err(self.note_error(e)),
            };
            let stream = match self
                .client
                .query_raw(&stmt, slice_iter(converted.as_refs()))
                .await
            {
                Ok(stream) => stream,
                Err(e) => return Err(self.note_error(e)),
            };
            self.collect(stream, Some(&stmt)).await
        }
    }

    /// Prepare a statement and hand the caller the handle.
    ///
    /// # Errors
    /// Driver errors from preparation, recorded for [`Session::last_error`].
    pub async fn prepare(&mut self, sql: &str) -> Result<Statement, SessionError> {
        match self.client.prepare(sql).await {
            Ok(stmt) => Ok(Statement::new(stmt, Arc::new(sql.to_string()))),
            Err(e) => Err(self.note_error(e)),
        }
    }

    /// Execute a prepared statement with bound parameters, returning a
    /// [`Cursor`] for row-by-row fetching. Works for SELECT and DML alike;
    /// for DML the cursor yields no rows and reports the affected count.
    ///
    /// # Errors
    /// Driver errors from execution, recorded for [`Session::last_error`].
    pub async fn execute(
        &mut self,
        statement: &Statement,
        params: &[SqlValue],
    ) -> Result<Cursor, SessionError> {
        let converted = Params::convert(params)?;
        match self
            .client
            .query_raw(&statement.stmt, slice_iter(converted.as_refs()))
            .await
        {
            Ok(stream) => Ok(Cursor::new(
                stream,
                statement.sql_arc(),
                statement.columns_arc(),
            )),
            Err(e) => Err(self.note_error(e)),
        }
    }

    /// Manage transaction boundaries via a keyword, case-insensitively:
    /// `START` / `START TRANSACTION` / `BEGIN` begin, `END` / `COMMIT`
    /// commit, `ROLLBACK` rolls back.
    ///
    /// # Errors
    /// `UnknownTransactionCommand` for any other keyword (nothing is issued
    /// to the server); otherwise driver errors from the underlying statement.
    pub async fn transaction(&mut self, status: &str) -> Result<(), SessionError> {
        let command: TransactionCommand = status.parse()?;
        debug!(command = command.as_sql(), "transaction");
        match self.client.batch_execute(command.as_sql()).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.note_error(e)),
        }
    }

    /// Last auto-generated identifier in this session, via the driver's
    /// last-value mechanism (`SELECT lastval()`).
    ///
    /// # Errors
    /// The driver error when no sequence has been used in this session yet.
    pub async fn last_insert_id(&mut self) -> Result<i64, SessionError> {
        match self.client.query_one("SELECT lastval()", &[]).await {
            Ok(row) => match row.try_get::<_, i64>(0) {
                Ok(id) => Ok(id),
                Err(e) => Err(self.note_error(e)),
            },
            Err(e) => Err(self.note_error(e)),
        }
    }

    /// Escape a string as a SQL literal for inline interpolation.
    ///
    /// Prefer bound parameters; this exists for the rare corner (DDL,
    /// `COPY` options) where binding is not available.
    #[must_use]
    pub fn quote(&self, string: &str) -> String {
        postgres_protocol::escape::escape_literal(string)
    }

    /// Client library identification string.
    #[must_use]
    pub fn client_info(&self) -> &'static str {
        concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION"),
            " (tokio-postgres)"
        )
    }

    /// Number of queries executed through [`Session::run`].
    #[must_use]
    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    /// Append-only log of `(query, params)` pairs run through
    /// [`Session::run`], in execution order.
    #[must_use]
    pub fn query_log(&self) -> &[QueryRecord] {
        &self.query_log
    }

    /// Most recent driver error recorded by any session operation, or `None`
    /// if nothing has failed yet.
    #[must_use]
    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Close the session: drop the connection handle and wait for the
    /// background driver task to finish. Consuming `self` makes
    /// use-after-close unrepresentable.
    pub async fn close(self) {
        let Session { client, driver, .. } = self;
        drop(client);
        let _ = driver.await;
        debug!("session closed");
    }

    async fn collect(
        &mut self,
        stream: RowStream,
        stmt: Option<&tokio_postgres::Statement>,
    ) -> Result<ResultSet, SessionError> {
        let mut stream = Box::pin(stream);
        let mut driver_rows = Vec::new();
        while let Some(next) = stream.next().await {
            match next {
                Ok(row) => driver_rows.push(row),
                Err(e) => return Err(self.note_error(e)),
            }
        }

        let mut result_set = match stmt {
            Some(stmt) => build_result_set_from_statement(stmt, &driver_rows)?,
            None => build_result_set_from_rows(&driver_rows)?,
        };
        result_set.rows_affected = stream.rows_affected().unwrap_or(0);
        Ok(result_set)
    }

    fn note_error(&mut self, err: tokio_postgres::Error) -> SessionError {
        self.last_error = Some(ErrorInfo::from_driver(&err));
        SessionError::PostgresError(err)
    }
}
