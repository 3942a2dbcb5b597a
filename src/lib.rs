//! Single-connection `PostgreSQL` session wrapper.
//!
//! A [`Session`] owns exactly one driver connection and layers a few
//! conveniences over it: a [`run`](Session::run) method that logs and counts
//! every query and materializes results into name-keyed rows, explicit
//! [`Statement`]/[`Cursor`] handles for bound-parameter reuse and row-by-row
//! streaming, keyword-driven transaction control, and introspection of the
//! most recent driver error.
//!
//! There is no pooling, no retry, and no shared state between sessions:
//! callers that need concurrency open one session per task.
//!
//! ```no_run
//! use pg_session::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SessionConfig::new("appdb", "app", "s3cret").host("db.internal");
//! let mut session = Session::connect(&cfg).await?;
//!
//! session.transaction("BEGIN").await?;
//! let rs = session
//!     .run(
//!         "INSERT INTO users (name) VALUES ($1)",
//!         &[SqlValue::Text("alice".into())],
//!     )
//!     .await?;
//! assert_eq!(rs.rows_affected, 1);
//! session.transaction("COMMIT").await?;
//!
//! let stmt = session.prepare("SELECT id, name FROM users WHERE id > $1").await?;
//! let mut cursor = session.execute(&stmt, &[SqlValue::Int(0)]).await?;
//! while let Some(row) = cursor.fetch().await? {
//!     println!("{:?} {:?}", row.get("id"), row.get("name"));
//! }
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod params;
pub mod query;
pub mod results;
pub mod session;
pub mod statement;
pub mod types;

pub mod prelude;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::SessionConfig;
pub use error::{ErrorInfo, SessionError};
pub use results::{ResultSet, Row};
pub use session::Session;
pub use statement::{Cursor, Statement};
pub use types::{QueryRecord, SqlValue, TransactionCommand};
