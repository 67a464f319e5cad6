//! Placeholder substitution over configuration trees.
//!
//! A subreport is stored as an unvalidated YAML tree. For every parent row,
//! the row's values are substituted into a copy of that tree:
//!
//! ```text
//! query: "select * from orders where customer = {id}"
//!                    + { id: 7 }
//! query: "select * from orders where customer = 7"
//! ```
//!
//! Each string is scanned once for `{name}` spans that contain no inner
//! braces. A span is replaced only when `name` is exactly a known field, so
//! `{id}` and `{identity}` never interfere. Unknown placeholders are kept
//! verbatim. Text around a span is irrelevant: `${id}` becomes `$7`.
//! Substituted values are never scanned again.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::driver::CellValue;

/// Pattern for `{name}` spans.
static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

/// Placeholder values, already rendered to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build fields from one result row. A repeated column name keeps its last value.
    pub fn from_row(columns: &[String], row: &[CellValue]) -> Self {
        columns.iter().zip(row).collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Return a copy of `tree` with placeholders replaced in every string leaf.
///
/// Mapping keys are preserved; non-string scalars are returned unchanged.
pub fn substitute(tree: &Value, fields: &Fields) -> Value {
    match tree {
        Value::String(s) => Value::String(substitute_str(s, fields).into_owned()),
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(key, value)| (key.clone(), substitute(value, fields)))
                .collect::<Mapping>(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| substitute(item, fields)).collect())
        }
        Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: substitute(&tagged.value, fields),
        })),
        Value::Null | Value::Bool(_) | Value::Number(_) => tree.clone(),
    }
}

/// Replace placeholders in a single string.
pub fn substitute_str<'a>(text: &'a str, fields: &Fields) -> Cow<'a, str> {
    if fields.is_empty() {
        return Cow::Borrowed(text);
    }

    PLACEHOLDER_PATTERN.replace_all(text, |caps: &Captures| match fields.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
}

/// Names of all placeholders appearing in the string leaves of `tree`.
pub fn placeholders(tree: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_placeholders(tree, &mut names);
    names
}

fn collect_placeholders(tree: &Value, names: &mut Vec<String>) {
    match tree {
        Value::String(s) => {
            for caps in PLACEHOLDER_PATTERN.captures_iter(s) {
                let name = caps[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Value::Mapping(map) => map.values().for_each(|v| collect_placeholders(v, names)),
        Value::Sequence(items) => items.iter().for_each(|v| collect_placeholders(v, names)),
        Value::Tagged(tagged) => collect_placeholders(&tagged.value, names),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
