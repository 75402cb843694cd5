use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in priority order, then falls back to
/// the first field of the payload.
pub fn print_minimal(value: &Value) {
    let payload = result_of(value);

    let priority_keys = ["co2e", "total_co2e", "rate", "record_count", "id"];

    if let Value::Object(map) = payload {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    if let Value::Array(items) = payload {
        println!("{}", items.len());
        return;
    }

    println!("{}", format_scalar(payload));
}
