//! Embedded `PostgreSQL` harness for tests and benchmarks.
//!
//! Gated behind the `test-utils` feature so the bundled server binaries stay
//! out of production builds.

use postgresql_embedded::PostgreSQL;

use crate::config::SessionConfig;

/// A running embedded `PostgreSQL` instance plus a [`SessionConfig`] that
/// points at it.
pub struct EmbeddedPostgres {
    postgresql: PostgreSQL,
    /// Connection parameters for the embedded server.
    pub config: SessionConfig,
}

/// Start a bundled `PostgreSQL` instance and create `dbname` on it.
///
/// Each call provisions an independent server on a free port, so tests can
/// run in parallel without coordinating.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, or
/// if database creation fails.
pub async fn start_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();

    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(dbname).await?;

    let settings = postgresql.settings();
    let config = SessionConfig::new(
        dbname,
        settings.username.clone(),
        settings.password.clone(),
    )
    .host(settings.host.clone())
    .port(settings.port);

    Ok(EmbeddedPostgres { postgresql, config })
}

impl EmbeddedPostgres {
    /// Stop the embedded server, discarding its data directory.
    pub async fn stop(self) {
        let _ = self.postgresql.stop().await;
    }
}
