//! MySQL driver backed by sqlx.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue};
use sqlx::{Column, ConnectOptions, Connection as _, Executor, Row, Statement, TypeInfo, ValueRef};
use tokio::runtime::Runtime;

use super::{runtime, CellValue, Connection, DatabaseDriver, DriverError, DriverResult, ResultSet};
use crate::config::{ConnectionConfig, DatabaseKind};

/// Opens MySQL connections. Without a hostname the sqlx default
/// (`localhost:3306`) is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl DatabaseDriver for MySqlDriver {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn open(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Connection>> {
        let mut options = MySqlConnectOptions::new().database(&config.database);
        if let Some(username) = &config.username {
            options = options.username(username);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(hostname) = &config.hostname {
            options = options.host(hostname);
        }
        if let Some(port) = config.port {
            options = options.port(port);
        }

        let runtime = runtime::current_thread()?;
        let conn = runtime.block_on(options.connect())?;
        Ok(Box::new(MySqlLiveConnection { runtime, conn }))
    }
}

struct MySqlLiveConnection {
    runtime: Runtime,
    conn: MySqlConnection,
}

impl Connection for MySqlLiveConnection {
    fn query(&mut self, sql: &str) -> DriverResult<ResultSet> {
        let conn = &mut self.conn;
        self.runtime.block_on(async move {
            let statement = (&mut *conn).prepare(sql).await?;
            let columns = statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect::<Vec<_>>();
            let rows = statement.query().fetch_all(&mut *conn).await?;
            let rows = rows.iter().map(decode_row).collect();
            Ok::<_, DriverError>(ResultSet::new(columns, rows))
        })
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        let MySqlLiveConnection { runtime, conn } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}

fn decode_row(row: &MySqlRow) -> Vec<CellValue> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &MySqlRow, idx: usize) -> CellValue {
    let type_name = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return CellValue::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return CellValue::Null,
    };

    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return CellValue::Integer(v);
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return i64::try_from(v).map_or_else(|_| CellValue::Text(v.to_string()), CellValue::Integer);
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return CellValue::Real(v);
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return CellValue::Real(f64::from(v));
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return CellValue::Bool(v);
    }
    if let Ok(v) = row.try_get::<Decimal, _>(idx) {
        return CellValue::Text(v.to_string());
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return CellValue::Text(v);
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
        return CellValue::Text(v.to_string());
    }
    if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
        return CellValue::Text(v.to_rfc3339());
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
        return CellValue::Text(v.to_string());
    }
    if let Ok(v) = row.try_get::<NaiveTime, _>(idx) {
        return CellValue::Text(v.to_string());
    }
    if let Ok(v) = row.try_get::<JsonValue, _>(idx) {
        return CellValue::Text(v.to_string());
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return CellValue::Blob(v);
    }
    if let Ok(v) = row.try_get_unchecked::<Vec<u8>, _>(idx) {
        tracing::debug!(column = idx, column_type = %type_name, "no typed decoder, using raw value");
        return CellValue::from_raw_bytes(v);
    }

    tracing::warn!(column = idx, column_type = %type_name, "undecodable mysql column, using NULL");
    CellValue::Null
}
