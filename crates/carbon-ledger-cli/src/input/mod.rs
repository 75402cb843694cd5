pub mod file;
pub mod stdin;

use carbon_ledger_core::dataset::Dataset;
use carbon_ledger_core::InMemoryStore;

/// Dataset source shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Path to dataset JSON file (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

impl DatasetArgs {
    pub fn load(&self) -> Result<InMemoryStore, Box<dyn std::error::Error>> {
        let dataset = if let Some(ref path) = self.input {
            file::read_dataset(path)?
        } else if let Some(dataset) = stdin::read_stdin_dataset()? {
            dataset
        } else {
            return Err("--input <dataset.json> or stdin required".into());
        };
        Ok(dataset.into_store()?)
    }

    /// Write the store back to the `--input` file.
    pub fn save(&self, store: &InMemoryStore) -> Result<(), Box<dyn std::error::Error>> {
        match self.input {
            Some(ref path) => file::write_dataset(path, &Dataset::from_store(store)),
            None => Err("--save requires --input <dataset.json>".into()),
        }
    }
}
