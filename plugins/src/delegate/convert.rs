//! Athena hands every cell back as text; these helpers turn result pages into
//! typed records and query parameters into Athena's literal form.

use dbagent_core::api::{QueryParams, Record};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Column {
    pub name: String,
    pub type_name: String,
}

impl Column {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// Renders params in insertion order as Athena `ExecutionParameters`.
///
/// Athena substitutes these server-side for positional `?` markers; each
/// entry must be a SQL literal.
pub(crate) fn render_params(params: &QueryParams) -> Result<Vec<String>, String> {
    params
        .iter()
        .map(|(name, value)| render_param(value).map_err(|e| format!("parameter `{name}`: {e}")))
        .collect()
}

fn render_param(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Value::Array(_) | Value::Object(_) => {
            Err("only scalar values can be bound".to_string())
        }
    }
}

/// Converts one cell according to its Athena column type.
pub(crate) fn convert_value(raw: Option<&str>, type_name: &str) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    let base = type_name
        .split('(')
        .next()
        .unwrap_or(type_name)
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "tinyint" | "smallint" | "integer" | "int" | "bigint" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "float" | "real" | "double" => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        "boolean" => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        },
        // decimal stays text so no precision is lost
        _ => Value::String(raw.to_string()),
    }
}

fn is_header_row(columns: &[Column], row: &[Option<String>]) -> bool {
    !columns.is_empty()
        && columns.len() == row.len()
        && columns
            .iter()
            .zip(row)
            .all(|(c, v)| v.as_deref() == Some(c.name.as_str()))
}

/// Builds records from one result page. On the first page Athena repeats
/// the column names as a leading row; `first_page` drops it.
pub(crate) fn rows_to_records(
    columns: &[Column],
    rows: Vec<Vec<Option<String>>>,
    first_page: bool,
) -> Vec<Record> {
    let skip = usize::from(first_page && rows.first().is_some_and(|r| is_header_row(columns, r)));
    rows.into_iter()
        .skip(skip)
        .map(|row| {
            let width = columns.len().max(row.len());
            let mut rec = Record::new();
            for idx in 0..width {
                let raw = row.get(idx).and_then(|v| v.as_deref());
                let (name, value) = match columns.get(idx) {
                    Some(col) => (col.name.clone(), convert_value(raw, &col.type_name)),
                    None => (format!("_col{idx}"), convert_value(raw, "varchar")),
                };
                rec.insert(name, value);
            }
            rec
        })
        .collect()
}
