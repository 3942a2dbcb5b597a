//! Convenient imports for common functionality.
//!
//! ```rust
//! use pg_session::prelude::*;
//! ```

pub use crate::config::SessionConfig;
pub use crate::error::{ErrorInfo, SessionError};
pub use crate::results::{ResultSet, Row};
pub use crate::session::Session;
pub use crate::statement::{Cursor, Statement};
pub use crate::types::{QueryRecord, SqlValue, TransactionCommand};
