use simplereports::config::{expand_connect_env, ConnectionConfig, DatabaseKind, ResolveOptions};
use simplereports::report::SpecError;

fn resolve(yaml: &str) -> Result<ConnectionConfig, SpecError> {
    let raw: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    ConnectionConfig::resolve(&raw)
}

#[test]
fn test_sqlite_needs_only_database() {
    let config = resolve("{type: sqlite, database: data/shop.db}").unwrap();
    assert_eq!(config, ConnectionConfig::sqlite("data/shop.db"));
}

#[test]
fn test_sqlite_drops_server_fields() {
    let config =
        resolve("{type: sqlite, database: x.db, username: u, password: p, hostname: h, port: 1}")
            .unwrap();
    assert_eq!(config.username, None);
    assert_eq!(config.password, None);
    assert_eq!(config.hostname, None);
    assert_eq!(config.port, None);
}

#[test]
fn test_server_without_hostname_has_no_port() {
    for kind in ["mysql", "postgresql"] {
        let config = resolve(&format!(
            "{{type: {}, database: shop, username: u, password: p}}",
            kind
        ))
        .unwrap();
        assert_eq!(config.hostname, None);
        assert_eq!(config.port, None);
    }
}

#[test]
fn test_hostname_gets_default_port() {
    let mysql = resolve("{type: mysql, database: shop, username: u, password: p, hostname: db}")
        .unwrap();
    assert_eq!(mysql.kind, DatabaseKind::MySql);
    assert_eq!(mysql.port, Some(3306));

    let postgres =
        resolve("{type: postgresql, database: shop, username: u, password: p, hostname: db}")
            .unwrap();
    assert_eq!(postgres.kind, DatabaseKind::Postgres);
    assert_eq!(postgres.port, Some(5432));
}

#[test]
fn test_explicit_port_is_kept() {
    let config = resolve(
        "{type: postgresql, database: shop, username: u, password: p, hostname: db, port: 6543}",
    )
    .unwrap();
    assert_eq!(config.port, Some(6543));
    assert_eq!(config.to_string(), "postgresql://u@db:6543/shop");
}

#[test]
fn test_port_from_substituted_text() {
    let config = resolve(
        "{type: mysql, database: shop, username: u, password: p, hostname: db, port: '3307'}",
    )
    .unwrap();
    assert_eq!(config.port, Some(3307));
}

#[test]
fn test_unsupported_kind() {
    let err = resolve("{type: oracle, database: x}").unwrap_err();
    assert_eq!(err, SpecError::InvalidConnectType("oracle".to_string()));
}

#[test]
fn test_missing_kind() {
    assert!(matches!(
        resolve("{database: x}").unwrap_err(),
        SpecError::InvalidConnectType(_)
    ));
}

#[test]
fn test_kind_alias() {
    let config = resolve("{kind: sqlite, database: x}").unwrap();
    assert_eq!(config.kind, DatabaseKind::Sqlite);
}

#[test]
fn test_missing_credentials() {
    assert_eq!(
        resolve("{type: mysql, database: shop, username: u}").unwrap_err(),
        SpecError::MissingCredentials
    );
    assert_eq!(
        resolve("{type: postgresql, database: shop, password: p}").unwrap_err(),
        SpecError::MissingCredentials
    );
}

#[test]
fn test_port_without_hostname() {
    assert_eq!(
        resolve("{type: mysql, database: shop, username: u, password: p, port: 3306}")
            .unwrap_err(),
        SpecError::PortWithoutHostname
    );
}

#[test]
fn test_missing_database() {
    assert_eq!(
        resolve("{type: sqlite}").unwrap_err(),
        SpecError::MissingField("database")
    );
}

#[test]
fn test_password_is_not_displayed() {
    let config = resolve(
        "{type: mysql, database: shop, username: reports, password: s3cret, hostname: db}",
    )
    .unwrap();
    let shown = config.to_string();
    assert_eq!(shown, "mysql://reports@db:3306/shop");
    assert!(!shown.contains("s3cret"));
}

#[test]
fn test_env_expansion_is_opt_in() {
    assert!(!ResolveOptions::default().expand_env);
}

#[test]
fn test_env_expansion_before_resolve() {
    std::env::set_var("SIMPLEREPORTS_TEST_DB_PATH", "/var/data/env.db");
    let raw: serde_yaml::Value =
        serde_yaml::from_str("{type: sqlite, database: '${SIMPLEREPORTS_TEST_DB_PATH}'}").unwrap();

    let expanded = ConnectionConfig::resolve(&expand_connect_env(&raw).unwrap()).unwrap();
    assert_eq!(expanded.database, "/var/data/env.db");

    let verbatim = ConnectionConfig::resolve(&raw).unwrap();
    assert_eq!(verbatim.database, "${SIMPLEREPORTS_TEST_DB_PATH}");
    std::env::remove_var("SIMPLEREPORTS_TEST_DB_PATH");
}

#[test]
fn test_dollar_password_is_verbatim() {
    let raw: serde_yaml::Value = serde_yaml::from_str(
        "{type: postgresql, database: shop, username: reports, password: 'pa$$word'}",
    )
    .unwrap();
    let config = ConnectionConfig::resolve(&expand_connect_env(&raw).unwrap()).unwrap();
    assert_eq!(config.password.as_deref(), Some("pa$$word"));
}

#[test]
fn test_missing_env_var() {
    let raw: serde_yaml::Value =
        serde_yaml::from_str("{type: sqlite, database: '${SIMPLEREPORTS_TEST_UNSET_VAR}'}").unwrap();
    let err = expand_connect_env(&raw).unwrap_err();
    assert!(matches!(err, SpecError::Environment(_)));
}
