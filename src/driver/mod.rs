//! Database drivers.
//!
//! The engine talks to databases through two small traits:
//!
//! ```text
//! DatabaseDriver::open(&ConnectionConfig) ──► Box<dyn Connection>
//! Connection::query(sql)                  ──► ResultSet { columns, rows }
//! Connection::close()
//! ```
//!
//! One driver exists per [`DatabaseKind`]. A [`DriverRegistry`] maps kinds to
//! drivers; a kind without a registered driver is reported as unavailable.
//!
//! | Kind | Driver | Cargo feature |
//! |------|--------|---------------|
//! | sqlite | [`SqliteDriver`] (rusqlite) | always |
//! | mysql | `MySqlDriver` (sqlx) | `mysql` |
//! | postgresql | `PostgresDriver` (sqlx) | `postgres` |

use std::collections::HashMap;
use std::fmt;

use crate::config::{ConnectionConfig, DatabaseKind};

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(any(feature = "mysql", feature = "postgres"))]
mod runtime;
mod sqlite;
mod value;

#[cfg(feature = "mysql")]
pub use mysql::MySqlDriver;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;
pub use value::{CellValue, ResultSet};

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a database driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(any(feature = "mysql", feature = "postgres"))]
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Opens connections for one database family.
pub trait DatabaseDriver {
    /// The family this driver serves.
    fn kind(&self) -> DatabaseKind;

    /// Open a live connection.
    fn open(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Connection>>;
}

/// A live database connection.
pub trait Connection {
    /// Run a query and return its columns and all of its rows.
    fn query(&mut self, sql: &str) -> DriverResult<ResultSet>;

    /// Close the connection, reporting any error raised while doing so.
    fn close(self: Box<Self>) -> DriverResult<()>;
}

/// Drivers available to the engine, keyed by database kind.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<DatabaseKind, Box<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every driver compiled into this build.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SqliteDriver));
        #[cfg(feature = "mysql")]
        registry.register(Box::new(MySqlDriver));
        #[cfg(feature = "postgres")]
        registry.register(Box::new(PostgresDriver));
        registry
    }

    /// Register a driver, replacing any previous driver for the same kind.
    pub fn register(&mut self, driver: Box<dyn DatabaseDriver>) -> Option<Box<dyn DatabaseDriver>> {
        self.drivers.insert(driver.kind(), driver)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_driver(mut self, driver: impl DatabaseDriver + 'static) -> Self {
        self.register(Box::new(driver));
        self
    }

    pub fn get(&self, kind: DatabaseKind) -> Option<&dyn DatabaseDriver> {
        self.drivers.get(&kind).map(|d| d.as_ref())
    }

    pub fn supports(&self, kind: DatabaseKind) -> bool {
        self.drivers.contains_key(&kind)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.drivers.keys().map(DatabaseKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("DriverRegistry").field("drivers", &kinds).finish()
    }
}
