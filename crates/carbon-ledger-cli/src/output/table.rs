use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_of, rows_of, scalars_of};

/// Format output as tables using the tabled crate: scalar fields first, then
/// any record rows, then report warnings and methodology.
pub fn print_table(value: &Value) {
    let payload = result_of(value);

    let scalars = scalars_of(payload);
    if !scalars.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in scalars {
            builder.push_record([key.to_string(), format_scalar(val)]);
        }
        println!("{}", Table::from(builder));
    }

    match rows_of(payload) {
        Some(rows) if rows.is_empty() => println!("(no records)"),
        Some(rows) => print_rows(&rows),
        None if !payload.is_object() => println!("{}", format_scalar(payload)),
        None => {}
    }

    if let Some(envelope) = value.as_object() {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    if let Value::String(s) = w {
                        println!("  - {}", s);
                    }
                }
            }
        }
        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {}", meth);
        }
    }
}

fn print_rows(rows: &[Map<String, Value>]) {
    let headers: Vec<String> = match rows.first() {
        Some(first) => first.keys().cloned().collect(),
        None => return,
    };
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}
