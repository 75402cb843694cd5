use serde_json::Value;
use std::io;

use super::{format_scalar, result_of, rows_of, scalars_of};

/// Write output as CSV to stdout. Record rows win over scalar fields; a
/// payload without rows is written as two-column `field,value`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let payload = result_of(value);

    if let Some(rows) = rows_of(payload) {
        if let Some(first) = rows.first() {
            let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
            let _ = wtr.write_record(&headers);
            for row in &rows {
                let cells: Vec<String> = headers
                    .iter()
                    .map(|h| row.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&cells);
            }
        }
    } else if payload.is_object() {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in scalars_of(payload) {
            let _ = wtr.write_record([key, format_scalar(val).as_str()]);
        }
    } else {
        let _ = wtr.write_record([format_scalar(payload)]);
    }

    let _ = wtr.flush();
}
