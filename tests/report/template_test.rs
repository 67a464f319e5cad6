use insta::assert_snapshot;
use serde_yaml::Value;
use simplereports::report::{substitute, Fields};
use simplereports::CellValue;

fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

fn row_fields(pairs: &[(&str, CellValue)]) -> Fields {
    let columns: Vec<String> = pairs.iter().map(|(c, _)| c.to_string()).collect();
    let row: Vec<CellValue> = pairs.iter().map(|(_, v)| v.clone()).collect();
    Fields::from_row(&columns, &row)
}

#[test]
fn test_identity_without_placeholders() {
    let tree = yaml(
        r#"
name: detail
query: select * from orders
connect: {type: sqlite, database: shop.db}
limits: [1, 2.5, true, null]
"#,
    );
    let fields = row_fields(&[("id", CellValue::Integer(7))]);
    assert_eq!(substitute(&tree, &fields), tree);
}

#[test]
fn test_query_substitution() {
    let tree = yaml("query: select {id} as X");
    let fields = row_fields(&[("id", CellValue::Integer(7))]);
    let result = substitute(&tree, &fields);
    assert_snapshot!(result["query"].as_str().unwrap(), @"select 7 as X");
}

#[test]
fn test_non_string_leaves_untouched() {
    let tree = yaml("{port: 5432, enabled: true, ratio: 0.5, nothing: null}");
    let fields = row_fields(&[("port", CellValue::Integer(1))]);
    assert_eq!(substitute(&tree, &fields), tree);
}

#[test]
fn test_keys_are_not_substituted() {
    let tree = yaml("'{id}': '{id}'");
    let fields = row_fields(&[("id", CellValue::Integer(3))]);
    let result = substitute(&tree, &fields);
    assert_eq!(result, yaml("'{id}': '3'"));
}

#[test]
fn test_nested_mappings_and_sequences() {
    let tree = yaml(
        r#"
connect:
  database: "db_{region}"
tags: ["{region}", "static"]
report:
  query: "select {region}"
"#,
    );
    let fields = row_fields(&[("region", CellValue::from("emea"))]);
    let result = substitute(&tree, &fields);

    assert_eq!(result["connect"]["database"], Value::from("db_emea"));
    assert_eq!(result["tags"][0], Value::from("emea"));
    assert_eq!(result["report"]["query"], Value::from("select emea"));
}

#[test]
fn test_input_is_not_mutated() {
    let tree = yaml("query: select {id}");
    let before = tree.clone();
    let fields = row_fields(&[("id", CellValue::Integer(1))]);
    let _ = substitute(&tree, &fields);
    assert_eq!(tree, before);
}

#[test]
fn test_value_rendering() {
    let tree = yaml("query: '{n} {r} {b} {t}'");
    let fields = row_fields(&[
        ("n", CellValue::Null),
        ("r", CellValue::Real(2.5)),
        ("b", CellValue::Bool(false)),
        ("t", CellValue::from("O'Brien")),
    ]);
    let result = substitute(&tree, &fields);
    assert_snapshot!(result["query"].as_str().unwrap(), @"NULL 2.5 false O'Brien");
}

#[test]
fn test_overlapping_names_resolve_exactly() {
    let tree = yaml("query: 'select {id}, {identity}, {id_2}'");
    let fields = row_fields(&[
        ("identity", CellValue::from("B")),
        ("id", CellValue::from("A")),
        ("id_2", CellValue::from("C")),
    ]);
    let result = substitute(&tree, &fields);
    assert_snapshot!(result["query"].as_str().unwrap(), @"select A, B, C");
}

#[test]
fn test_dollar_before_placeholder() {
    let tree = yaml(r#"query: "select '${id}' as X""#);
    let fields = row_fields(&[("id", CellValue::Integer(7))]);
    let result = substitute(&tree, &fields);
    assert_snapshot!(result["query"].as_str().unwrap(), @"select '$7' as X");
}

#[test]
fn test_special_characters_in_values_are_inserted_verbatim() {
    let tree = yaml("{query: \"select '{name}'\", connect: {database: 'data/{name}.db'}}");
    let fields = row_fields(&[("name", CellValue::from("cost$2024{id}"))]);
    let result = substitute(&tree, &fields);
    assert_eq!(result["query"].as_str(), Some("select 'cost$2024{id}'"));
    assert_eq!(result["connect"]["database"].as_str(), Some("data/cost$2024{id}.db"));
}
