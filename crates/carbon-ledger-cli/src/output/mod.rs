pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The payload of a report envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Row-shaped data in a payload: a bare array of objects, a report's
/// `records`, or a summary's `by_type` map (flattened with an
/// `emission_type` column).
pub(crate) fn rows_of(payload: &Value) -> Option<Vec<Map<String, Value>>> {
    match payload {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
        ),
        Value::Object(map) => {
            if let Some(Value::Array(records)) = map.get("records") {
                return rows_of(&Value::Array(records.clone()));
            }
            if let Some(Value::Object(by_type)) = map.get("by_type") {
                let rows = by_type
                    .iter()
                    .map(|(name, summary)| {
                        let mut row = Map::new();
                        row.insert("emission_type".into(), Value::String(name.clone()));
                        if let Value::Object(fields) = summary {
                            row.extend(fields.clone());
                        }
                        row
                    })
                    .collect();
                return Some(rows);
            }
            None
        }
        _ => None,
    }
}

/// Scalar fields of a payload object, skipping nested rows.
pub(crate) fn scalars_of(payload: &Value) -> Vec<(&str, &Value)> {
    match payload {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_array() && !v.is_object())
            .map(|(k, v)| (k.as_str(), v))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
