mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::emissions::{AddEmissionArgs, CalculateArgs, EmissionsArgs, SummaryArgs, TotalArgs};
use commands::entities::{ClientsArgs, EmissionTypesArgs, LocationsArgs};
use commands::rates::{RatesArgs, ResolveRateArgs, UpsertRateArgs};

/// Emissions tracking and CO2e conversion
#[derive(Parser)]
#[command(
    name = "cle",
    version,
    about = "Emissions tracking and CO2e conversion",
    long_about = "Query and maintain a carbon-ledger dataset: resolve conversion rates, \
                  convert activity data to CO2e, and aggregate emissions by location, \
                  client, date range or emission type."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the conversion rate for an emission type, location and year
    ResolveRate(ResolveRateArgs),
    /// Insert or update a conversion rate
    UpsertRate(UpsertRateArgs),
    /// List conversion rates
    Rates(RatesArgs),
    /// Convert one measurement to CO2e
    Calculate(CalculateArgs),
    /// List emissions records with computed CO2e
    Emissions(EmissionsArgs),
    /// Total CO2e for a location or client
    Total(TotalArgs),
    /// Per emission-type summary for a location
    Summary(SummaryArgs),
    /// Record a new measurement
    AddEmission(AddEmissionArgs),
    /// List clients
    Clients(ClientsArgs),
    /// List locations
    Locations(LocationsArgs),
    /// List emission types
    EmissionTypes(EmissionTypesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ResolveRate(args) => commands::rates::run_resolve_rate(args),
        Commands::UpsertRate(args) => commands::rates::run_upsert_rate(args),
        Commands::Rates(args) => commands::rates::run_rates(args),
        Commands::Calculate(args) => commands::emissions::run_calculate(args),
        Commands::Emissions(args) => commands::emissions::run_emissions(args),
        Commands::Total(args) => commands::emissions::run_total(args),
        Commands::Summary(args) => commands::emissions::run_summary(args),
        Commands::AddEmission(args) => commands::emissions::run_add_emission(args),
        Commands::Clients(args) => commands::entities::run_clients(args),
        Commands::Locations(args) => commands::entities::run_locations(args),
        Commands::EmissionTypes(args) => commands::entities::run_emission_types(args),
        Commands::Version => {
            println!("cle {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
