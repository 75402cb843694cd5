use clap::Args;
use serde_json::Value;

use carbon_ledger_core::registry;

use crate::input::DatasetArgs;

/// Arguments for listing clients
#[derive(Args)]
pub struct ClientsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

/// Arguments for listing locations
#[derive(Args)]
pub struct LocationsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Only locations owned by this client id
    #[arg(long)]
    pub client: Option<u64>,
}

/// Arguments for listing emission types
#[derive(Args)]
pub struct EmissionTypesArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

pub fn run_clients(args: ClientsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    Ok(serde_json::to_value(registry::all_clients(&store))?)
}

pub fn run_locations(args: LocationsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let locations = match args.client {
        Some(client_id) => {
            registry::get_client(&store, client_id)?;
            registry::locations_for_client(&store, client_id)
        }
        None => registry::all_locations(&store),
    };
    Ok(serde_json::to_value(locations)?)
}

pub fn run_emission_types(args: EmissionTypesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    Ok(serde_json::to_value(registry::all_emission_types(&store))?)
}
