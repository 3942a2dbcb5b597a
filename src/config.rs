use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default host used when none is supplied.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Driver options applied unless the caller overrides them. The server-side
/// client encoding is pinned to UTF8 (which is also the only encoding the
/// driver itself speaks) so text round-trips losslessly.
const DEFAULT_OPTIONS: &[(&str, &str)] = &[("options", "-c client_encoding=UTF8")];

/// Connection parameters for a [`Session`](crate::Session).
///
/// Builder-style: required fields go through [`SessionConfig::new`], the rest
/// have defaults.
///
/// ```rust
/// use pg_session::SessionConfig;
///
/// let cfg = SessionConfig::new("appdb", "app", "s3cret")
///     .host("db.internal")
///     .port(5433)
///     .option("application_name", "worker-7");
/// # let _ = cfg;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Database (schema) name.
    pub dbname: String,
    /// Role to authenticate as.
    pub user: String,
    /// Password for the role.
    pub password: String,
    /// Server host; defaults to the loopback address.
    pub host: String,
    /// Server port; defaults to the standard PostgreSQL port.
    pub port: u16,
    /// Extra driver options merged over the built-in defaults.
    options: Vec<(String, String)>,
}

impl SessionConfig {
    /// Create a config with the given database, user, and password, using
    /// default host and port.
    pub fn new(
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            options: Vec::new(),
        }
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Add a driver option, overriding the built-in default of the same name
    /// if there is one. Later calls with the same key win.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.options.retain(|(k, _)| *k != key);
        self.options.push((key, value.into()));
        self
    }

    /// Assemble the driver connection string: space-delimited `key=value`
    /// pairs per the `tokio-postgres` config grammar, with values quoted
    /// when they contain whitespace, quotes, or backslashes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConfigError` when `dbname` or `user` is empty.
    pub fn connection_string(&self) -> Result<String, SessionError> {
        if self.dbname.is_empty() {
            return Err(SessionError::ConfigError("dbname is required".to_string()));
        }
        if self.user.is_empty() {
            return Err(SessionError::ConfigError("user is required".to_string()));
        }

        let mut pairs: Vec<(String, String)> = vec![
            ("host".to_string(), self.host.clone()),
            ("port".to_string(), self.port.to_string()),
            ("dbname".to_string(), self.dbname.clone()),
            ("user".to_string(), self.user.clone()),
        ];
        if !self.password.is_empty() {
            pairs.push(("password".to_string(), self.password.clone()));
        }
        for (key, default) in DEFAULT_OPTIONS {
            if !self.options.iter().any(|(k, _)| k == key) {
                pairs.push(((*key).to_string(), (*default).to_string()));
            }
        }
        pairs.extend(self.options.iter().cloned());

        Ok(pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", quote_value(v)))
            .collect::<Vec<_>>()
            .join(" "))
    }
}

// The driver grammar requires quoting for empty values and values containing
// whitespace, single quotes, or backslashes.
fn quote_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quoting {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
