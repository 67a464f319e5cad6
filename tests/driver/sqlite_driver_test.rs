use simplereports::config::{ConnectionConfig, DatabaseKind};
use simplereports::driver::{Connection, DatabaseDriver, DriverRegistry, SqliteDriver};
use simplereports::CellValue;
use tempfile::TempDir;

fn seeded_database() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "create table customers (id integer primary key, name text, balance real);
         insert into customers values (1, 'Ada', 10.5), (2, 'Grace', null);",
    )
    .unwrap();
    (dir, path.display().to_string())
}

#[test]
fn test_query_file_database() {
    let (_dir, path) = seeded_database();
    let mut conn = SqliteDriver.open(&ConnectionConfig::sqlite(path)).unwrap();

    let result = conn
        .query("select id, name, balance from customers order by id")
        .unwrap();

    assert_eq!(result.columns, vec!["id", "name", "balance"]);
    assert_eq!(
        result.rows,
        vec![
            vec![
                CellValue::Integer(1),
                CellValue::from("Ada"),
                CellValue::Real(10.5)
            ],
            vec![CellValue::Integer(2), CellValue::from("Grace"), CellValue::Null],
        ]
    );
    conn.close().unwrap();
}

#[test]
fn test_duplicate_column_names_are_kept() {
    let (_dir, path) = seeded_database();
    let mut conn = SqliteDriver.open(&ConnectionConfig::sqlite(path)).unwrap();
    let result = conn.query("select id, id from customers where id = 1").unwrap();
    assert_eq!(result.columns, vec!["id", "id"]);
}

#[test]
fn test_unknown_table_is_an_error() {
    let (_dir, path) = seeded_database();
    let mut conn = SqliteDriver.open(&ConnectionConfig::sqlite(path)).unwrap();
    let err = conn.query("select * from invoices").unwrap_err();
    assert!(err.to_string().contains("invoices"));
}

#[test]
fn test_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("dir").join("x.db");
    let config = ConnectionConfig::sqlite(path.display().to_string());
    assert!(SqliteDriver.open(&config).is_err());
}

#[test]
fn test_registry_lookup() {
    let registry = DriverRegistry::builtin();
    let driver = registry.get(DatabaseKind::Sqlite).unwrap();
    assert_eq!(driver.kind(), DatabaseKind::Sqlite);

    let mut conn = driver.open(&ConnectionConfig::sqlite(":memory:")).unwrap();
    let result = conn.query("select 1 as A").unwrap();
    assert_eq!(result.len(), 1);
}
