use std::io::{self, Read};

use carbon_ledger_core::dataset::Dataset;

/// Read a dataset piped on stdin.
/// Returns None when stdin is a TTY or carries nothing but whitespace.
pub fn read_stdin_dataset() -> Result<Option<Dataset>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let dataset = Dataset::from_json(trimmed)
        .map_err(|e| format!("Failed to parse dataset from stdin: {}", e))?;
    Ok(Some(dataset))
}
