use std::fs;
use std::path::{Path, PathBuf};

use carbon_ledger_core::dataset::Dataset;
use tracing::info;

/// Read and parse a dataset file.
pub fn read_dataset(path: &str) -> Result<Dataset, Box<dyn std::error::Error>> {
    let canonical = resolve_existing(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let dataset = Dataset::from_json(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(dataset)
}

/// Overwrite a dataset file in place.
pub fn write_dataset(path: &str, dataset: &Dataset) -> Result<(), Box<dyn std::error::Error>> {
    let canonical = resolve_existing(path)?;
    let json = dataset.to_json()?;
    fs::write(&canonical, json + "\n")
        .map_err(|e| format!("Failed to write '{}': {}", canonical.display(), e))?;
    info!(path = %canonical.display(), "dataset saved");
    Ok(())
}

/// Resolve against the working directory and require an existing regular file.
fn resolve_existing(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
