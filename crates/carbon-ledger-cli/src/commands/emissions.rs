use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use carbon_ledger_core::registry;
use carbon_ledger_core::reports;
use carbon_ledger_core::{Co2eCalculator, EmissionsAggregator, EmissionsData, UNASSIGNED_ID};

use crate::input::DatasetArgs;

/// Arguments for converting one ad-hoc measurement to CO2e
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Emission type id
    #[arg(long)]
    pub emission_type: u64,

    /// Location id
    #[arg(long)]
    pub location: u64,

    /// Measurement date (YYYY-MM-DD); its year selects the rate
    #[arg(long)]
    pub date: NaiveDate,

    /// Activity value in the emission type's unit
    #[arg(long)]
    pub value: f64,
}

/// Arguments for listing enriched emissions records
#[derive(Args)]
pub struct EmissionsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Restrict to a location id
    #[arg(long, conflicts_with = "client")]
    pub location: Option<u64>,

    /// Restrict to every location of a client id
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub client: Option<u64>,

    /// First date of the range, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last date of the range, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

/// Arguments for total CO2e
#[derive(Args)]
#[command(group(clap::ArgGroup::new("scope").required(true).args(["location", "client"])))]
pub struct TotalArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Location id
    #[arg(long)]
    pub location: Option<u64>,

    /// Client id
    #[arg(long)]
    pub client: Option<u64>,
}

/// Arguments for the per emission-type summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Location id
    #[arg(long)]
    pub location: u64,
}

/// Arguments for recording a new measurement
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AddEmissionArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Emission type id
    #[arg(long)]
    pub emission_type: u64,

    /// Location id
    #[arg(long)]
    pub location: u64,

    /// Measurement date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Activity value in the emission type's unit
    #[arg(long)]
    pub value: f64,

    /// Write the updated dataset back to the --input file
    #[arg(long)]
    pub save: bool,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let data = EmissionsData {
        id: UNASSIGNED_ID,
        date: args.date,
        value: args.value,
        emission_type_id: args.emission_type,
        location_id: args.location,
    };
    let (co2e, rate) = Co2eCalculator::new(&store).calculate_with_rate(&data)?;
    Ok(json!({
        "co2e": co2e,
        "value": data.value,
        "rate": rate.rate,
        "rate_unit": rate.unit,
        "year": rate.year,
    }))
}

pub fn run_emissions(args: EmissionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let value = match (args.start, args.end, args.location, args.client) {
        (Some(start), Some(end), location, _) => {
            serde_json::to_value(reports::date_range_report(&store, start, end, location)?)?
        }
        (_, _, Some(location), _) => serde_json::to_value(reports::location_report(&store, location)?)?,
        (_, _, _, Some(client)) => serde_json::to_value(reports::client_report(&store, client)?)?,
        _ => serde_json::to_value(EmissionsAggregator::new(&store).all()?)?,
    };
    Ok(value)
}

pub fn run_total(args: TotalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let aggregator = EmissionsAggregator::new(&store);
    if let Some(location) = args.location {
        let location = registry::get_location(&store, location)?;
        Ok(json!({
            "location_id": location.id,
            "location_name": location.name,
            "total_co2e": aggregator.total_co2e(location.id)?,
        }))
    } else if let Some(client) = args.client {
        let client = registry::get_client(&store, client)?;
        Ok(json!({
            "client_id": client.id,
            "client_name": client.name,
            "total_co2e": aggregator.total_co2e_for_client(client.id)?,
        }))
    } else {
        Err("--location or --client required".into())
    }
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = args.dataset.load()?;
    let result = reports::summary_report(&store, args.location)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_add_emission(args: AddEmissionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = args.dataset.load()?;
    let saved = registry::add_emission(
        &mut store,
        args.emission_type,
        args.location,
        args.date,
        args.value,
    )?;
    if args.save {
        args.dataset.save(&store)?;
    }
    Ok(serde_json::to_value(saved)?)
}
