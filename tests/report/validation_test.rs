use simplereports::config::ResolveOptions;
use simplereports::report::{ReportDocument, ReportSpec, SpecError, UNNAMED_ROOT};
use simplereports::{ErrorKind, OutputFormat, ReportError};

fn validate(yaml: &str) -> Result<ReportSpec, ReportError> {
    let document = ReportDocument::from_yaml(yaml)?;
    ReportSpec::validate_root(document.root()?, &ResolveOptions::default())
}

fn spec_source(err: ReportError) -> SpecError {
    match err {
        ReportError::Spec { source, .. } => source,
        other => panic!("expected a spec error, got {:?}", other),
    }
}

#[test]
fn test_output_format_from_extension() {
    for (path, format) in [
        ("out.csv", OutputFormat::Csv),
        ("out.json", OutputFormat::Json),
        ("reports/2024.q1/out.xml", OutputFormat::Xml),
    ] {
        let spec = validate(&format!(
            "report: {{name: r, query: q, output: '{}', connect: {{type: sqlite, database: x}}}}",
            path
        ))
        .unwrap();
        let output = spec.output.unwrap();
        assert_eq!(output.format, format);
        assert_eq!(output.path, path);
    }
}

#[test]
fn test_output_without_extension_fails() {
    let err = validate(
        "report: {name: r, query: q, output: results, connect: {type: sqlite, database: x}}",
    )
    .unwrap_err();
    assert_eq!(err.report_name(), Some("r"));
    assert_eq!(
        spec_source(err),
        SpecError::UnsupportedFormat("results".to_string())
    );
}

#[test]
fn test_output_with_unknown_extension_fails() {
    let err =
        validate("report: {name: r, query: q, output: r.xlsx, connect: {type: sqlite, database: x}}")
            .unwrap_err();
    assert!(matches!(spec_source(err), SpecError::UnsupportedFormat(_)));
}

#[test]
fn test_unsupported_connection_kind_fails() {
    let err =
        validate("report: {name: r, query: q, output: r.csv, connect: {type: mssql, database: x}}")
            .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Spec);
    assert_eq!(
        spec_source(err),
        SpecError::InvalidConnectType("mssql".to_string())
    );
}

#[test]
fn test_missing_credentials_fails() {
    let err = validate(
        "report: {name: r, query: q, output: r.csv, connect: {type: mysql, database: x, username: u}}",
    )
    .unwrap_err();
    assert_eq!(spec_source(err), SpecError::MissingCredentials);
}

#[test]
fn test_port_without_hostname_fails() {
    let err = validate(
        "report: {name: r, query: q, output: r.csv, connect: {type: postgresql, database: x, username: u, password: p, port: 5432}}",
    )
    .unwrap_err();
    assert_eq!(spec_source(err), SpecError::PortWithoutHostname);
}

#[test]
fn test_missing_required_root_fields() {
    for (yaml, field) in [
        ("report: {query: q, output: r.csv, connect: {type: sqlite, database: x}}", "name"),
        ("report: {name: r, output: r.csv, connect: {type: sqlite, database: x}}", "query"),
        ("report: {name: r, query: q, connect: {type: sqlite, database: x}}", "output"),
        ("report: {name: r, query: q, output: r.csv}", "connect"),
    ] {
        let err = validate(yaml).unwrap_err();
        assert_eq!(spec_source(err), SpecError::MissingField(field), "{}", yaml);
    }
}

#[test]
fn test_missing_top_level_report() {
    let err = validate("name: r\nquery: q\n").unwrap_err();
    assert_eq!(err.report_name(), Some(UNNAMED_ROOT));
    assert_eq!(err.to_string(), "invalid report '<root>': at least one report is expected");
}

#[test]
fn test_nested_report_validated_lazily() {
    // The nested report is invalid as written, but it is only a template.
    let spec = validate(
        r#"
report:
  name: customers
  query: select id from customers
  output: customers.json
  connect: {type: sqlite, database: shop.db}
  report:
    query: select * from orders where customer = {id}
    connect: {type: "{engine}", database: x}
"#,
    )
    .unwrap();

    let template = spec.subreport.unwrap();
    assert_eq!(template.placeholders(), vec!["id", "engine"]);
}

#[test]
fn test_subreport_instantiated_then_validated() {
    let spec = validate(
        r#"
report:
  name: customers
  query: select id from customers
  output: customers.json
  connect: {type: sqlite, database: shop.db}
  report:
    name: orders
    query: select * from orders where customer = {id}
    connect: {type: sqlite, database: "shard_{id}.db"}
"#,
    )
    .unwrap();

    let template = spec.subreport.as_ref().unwrap();
    let fields = [("id", 42)].into_iter().collect();
    let child =
        ReportSpec::validate_subreport(&template.instantiate(&fields), &spec.subreport_default_name())
            .unwrap();

    assert_eq!(child.name, "orders");
    assert_eq!(child.query, "select * from orders where customer = 42");
    assert_eq!(child.connect.unwrap().database, "shard_42.db");
    assert!(child.output.is_none());
}

#[test]
fn test_dollar_password_kept_with_env_expansion() {
    let document = ReportDocument::from_yaml(
        r#"
report:
  name: sales
  query: select 1
  output: sales.csv
  connect: {type: mysql, database: shop, username: reports, password: pa$$word}
"#,
    )
    .unwrap();
    let options = ResolveOptions { expand_env: true };
    let spec = ReportSpec::validate_root(document.root().unwrap(), &options).unwrap();
    assert_eq!(spec.connect.unwrap().password.as_deref(), Some("pa$$word"));
}

#[test]
fn test_row_values_never_env_expanded() {
    std::env::set_var("SIMPLEREPORTS_VALIDATION_DIR", "/srv");
    let document = ReportDocument::from_yaml(
        r#"
report:
  name: customers
  query: select name from customers
  output: customers.csv
  connect: {type: sqlite, database: shop.db}
  report:
    query: select 1
    connect: {type: sqlite, database: "${SIMPLEREPORTS_VALIDATION_DIR}/{name}.db"}
"#,
    )
    .unwrap();
    let options = ResolveOptions { expand_env: true };
    let spec = ReportSpec::validate_root(document.root().unwrap(), &options).unwrap();
    std::env::remove_var("SIMPLEREPORTS_VALIDATION_DIR");

    let fields = [("name", "cost$2024${HOME}")].into_iter().collect();
    let child = ReportSpec::validate_subreport(
        &spec.subreport.as_ref().unwrap().instantiate(&fields),
        &spec.subreport_default_name(),
    )
    .unwrap();
    assert_eq!(child.connect.unwrap().database, "/srv/cost$2024${HOME}.db");
}
