//! SQLite driver backed by rusqlite.

use rusqlite::types::ValueRef;

use super::{CellValue, Connection, DatabaseDriver, DriverResult, ResultSet};
use crate::config::{ConnectionConfig, DatabaseKind};

/// Opens SQLite database files (created if missing) or `:memory:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl DatabaseDriver for SqliteDriver {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    fn open(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Connection>> {
        let conn = rusqlite::Connection::open(&config.database)?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

/// A live SQLite connection.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str) -> DriverResult<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(cell_from_ref(row.get_ref(idx)?));
            }
            rows.push(cells);
        }

        Ok(ResultSet::new(columns, rows))
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        let SqliteConnection { conn } = *self;
        conn.close().map_err(|(_, e)| e.into())
    }
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(n) => CellValue::Integer(n),
        ValueRef::Real(x) => CellValue::Real(x),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}
