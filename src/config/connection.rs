//! Database connection configuration.
//!
//! A report's `connect` block is resolved into a [`ConnectionConfig`]:
//!
//! ```yaml
//! connect:
//!   type: mysql
//!   database: shop
//!   username: reports
//!   password: ${SHOP_DB_PASSWORD}
//!   hostname: db.internal   # port defaults to 3306
//! ```
//!
//! Rules, applied in order:
//! 1. `type` must be one of `sqlite`, `mysql`, `postgresql`.
//! 2. `mysql` and `postgresql` need both `username` and `password`.
//! 3. `port` without `hostname` is rejected.
//! 4. `hostname` without `port` gets the driver's default port.
//!
//! `sqlite` only needs `database`; host, port and credentials are dropped.
//!
//! With [`ResolveOptions::expand_env`] set, `${VAR}` references in the text
//! fields are expanded by [`expand_connect_env`] while the document is still
//! raw. Values substituted from parent rows are never expanded.

use std::fmt;

use serde_yaml::{Mapping, Value};

use super::settings::expand_env_vars;
use crate::report::SpecError;

/// Supported database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// SQLite database file (or `:memory:`).
    Sqlite,
    /// MySQL / MariaDB server.
    MySql,
    /// PostgreSQL server.
    Postgres,
}

impl DatabaseKind {
    /// Parse the kind from its configuration name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, SpecError> {
        match s {
            "sqlite" => Ok(DatabaseKind::Sqlite),
            "mysql" => Ok(DatabaseKind::MySql),
            "postgresql" => Ok(DatabaseKind::Postgres),
            other => Err(SpecError::InvalidConnectType(other.to_string())),
        }
    }

    /// Configuration name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Postgres => "postgresql",
        }
    }

    /// Default server port, `None` for file databases.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseKind::Sqlite => None,
            DatabaseKind::MySql => Some(3306),
            DatabaseKind::Postgres => Some(5432),
        }
    }

    /// Whether this kind talks to a server and therefore needs credentials.
    pub fn is_server(&self) -> bool {
        !matches!(self, DatabaseKind::Sqlite)
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied to `connect` blocks when a document is parsed.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Expand `${VAR}` references in text fields. Off unless enabled.
    pub expand_env: bool,
}

/// Fields eligible for environment expansion.
const ENV_FIELDS: [&str; 4] = ["database", "username", "password", "hostname"];

/// Normalized database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database family.
    pub kind: DatabaseKind,
    /// Database name, or file path for SQLite.
    pub database: String,
    /// Username (server databases only).
    pub username: Option<String>,
    /// Password (server databases only).
    pub password: Option<String>,
    /// Server hostname. Absent means the driver's local default.
    pub hostname: Option<String>,
    /// Server port. Only ever set together with `hostname`.
    pub port: Option<u16>,
}

impl ConnectionConfig {
    /// Create a SQLite configuration.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            database: path.into(),
            username: None,
            password: None,
            hostname: None,
            port: None,
        }
    }

    /// Resolve a raw `connect` mapping into a normalized configuration.
    ///
    /// Text is taken verbatim. Environment references must already have been
    /// expanded with [`expand_connect_env`].
    pub fn resolve(raw: &Value) -> Result<Self, SpecError> {
        let map = raw.as_mapping().ok_or(SpecError::InvalidField {
            field: "connect",
            expected: "a mapping",
        })?;

        let kind_name = text_field(map, "type")?
            .or(text_field(map, "kind")?)
            .ok_or(SpecError::InvalidConnectType("<missing>".to_string()))?;
        let kind = DatabaseKind::from_str(&kind_name)?;

        let database = text_field(map, "database")?.ok_or(SpecError::MissingField("database"))?;

        if !kind.is_server() {
            return Ok(Self::sqlite(database));
        }

        let username = text_field(map, "username")?;
        let password = text_field(map, "password")?;
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err(SpecError::MissingCredentials),
        };

        let hostname = text_field(map, "hostname")?;
        let port = port_field(map)?;

        let port = match (&hostname, port) {
            (None, Some(_)) => return Err(SpecError::PortWithoutHostname),
            (Some(_), None) => kind.default_port(),
            (_, port) => port,
        };

        Ok(Self {
            kind,
            database,
            username: Some(username),
            password: Some(password),
            hostname,
            port,
        })
    }
}

impl fmt::Display for ConnectionConfig {
    /// Renders a password-free description, e.g. `mysql://reports@db:3306/shop`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DatabaseKind::Sqlite => write!(f, "sqlite:{}", self.database),
            kind => {
                write!(f, "{}://", kind)?;
                if let Some(user) = &self.username {
                    write!(f, "{}@", user)?;
                }
                match (&self.hostname, self.port) {
                    (Some(host), Some(port)) => write!(f, "{}:{}", host, port)?,
                    (Some(host), None) => write!(f, "{}", host)?,
                    _ => f.write_str("localhost")?,
                }
                write!(f, "/{}", self.database)
            }
        }
    }
}

/// Expand `${VAR}` references in the text fields of a raw `connect` block.
///
/// Non-mapping values and non-string fields are returned unchanged; resolving
/// reports those.
pub fn expand_connect_env(raw: &Value) -> Result<Value, SpecError> {
    let Some(map) = raw.as_mapping() else {
        return Ok(raw.clone());
    };

    let mut expanded = map.clone();
    for field in ENV_FIELDS {
        if let Some(Value::String(text)) = map.get(field) {
            let text = expand_env_vars(text).map_err(|e| SpecError::Environment(e.to_string()))?;
            expanded.insert(Value::from(field), Value::String(text));
        }
    }
    Ok(Value::Mapping(expanded))
}

/// Read a scalar field as text. Numbers and booleans are rendered.
fn text_field(map: &Mapping, field: &'static str) -> Result<Option<String>, SpecError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(SpecError::InvalidField {
            field,
            expected: "a scalar value",
        }),
    }
}

fn port_field(map: &Mapping) -> Result<Option<u16>, SpecError> {
    let invalid = |shown: String| SpecError::InvalidPort(shown);
    match map.get("port") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .filter(|p| *p != 0)
            .map(Some)
            .ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .map(Some)
            .ok_or_else(|| invalid(s.clone())),
        Some(other) => Err(invalid(format!("{:?}", other))),
    }
}
