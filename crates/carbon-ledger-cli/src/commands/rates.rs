use clap::Args;
use serde_json::Value;

use carbon_ledger_core::{upsert_conversion_rate, ConversionRateInput, ConversionRateResolver};

use crate::input::DatasetArgs;

/// Arguments for looking up a single conversion rate
#[derive(Args)]
pub struct ResolveRateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Emission type id
    #[arg(long)]
    pub emission_type: u64,

    /// Location id
    #[arg(long)]
    pub location: u64,

    /// Effective year of the rate
    #[arg(long)]
    pub year: i32,
}

/// Arguments for inserting or updating a conversion rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct UpsertRateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Emission type id
    #[arg(long)]
    pub emission_type: Option<u64>,

    /// Location id
    #[arg(long)]
    pub location: Option<u64>,

    /// Effective year of the rate
    #[arg(long)]
    pub year: i32,

    /// CO2e per activity unit (e.g. 0.2071)
    #[arg(long)]
    pub rate: f64,

    /// Unit label (e.g. kgCO2e/kWh)
    #[arg(long)]
    pub unit: String,

    /// Free-text description or source of the factor
    #[arg(long, default_value = "")]
    pub description: String,

    /// Write the updated dataset back to the --input file
    #[arg(long)]
    pub save: bool,
}

/// Arguments for listing conversion rates
#[derive(Args)]
pub struct RatesArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Only rates for this location id
    #[arg(long)]
    pub location: Option<u64>,
}

pub fn run_resolve_rate(args: ResolveRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let rate =
        ConversionRateResolver::new(&store).resolve(args.emission_type, args.location, args.year)?;
    Ok(serde_json::to_value(rate)?)
}

pub fn run_upsert_rate(args: UpsertRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = args.dataset.load()?;
    let input = ConversionRateInput {
        rate: args.rate,
        unit: args.unit,
        description: args.description,
        year: args.year,
        emission_type_id: args.emission_type,
        location_id: args.location,
    };
    let saved = upsert_conversion_rate(&mut store, &input)?;
    if args.save {
        args.dataset.save(&store)?;
    }
    Ok(serde_json::to_value(saved)?)
}

pub fn run_rates(args: RatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let resolver = ConversionRateResolver::new(&store);
    let rates = match args.location {
        Some(location_id) => resolver.rates_for_location(location_id),
        None => resolver.all_rates(),
    };
    Ok(serde_json::to_value(rates)?)
}
