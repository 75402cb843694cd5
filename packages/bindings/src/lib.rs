use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;

use carbon_ledger_core::dataset::{load_dataset, Dataset};
use carbon_ledger_core::{
    reports, upsert_conversion_rate as upsert, Co2eCalculator, ConversionRateInput,
    ConversionRateResolver, EmissionsAggregator, EmissionsData, InMemoryStore,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// JS numbers arrive as i64; identifiers are unsigned.
fn to_id(value: i64, name: &str) -> NapiResult<u64> {
    u64::try_from(value).map_err(|_| to_napi_error(format!("{name} must be non-negative")))
}

fn to_date(value: &str, name: &str) -> NapiResult<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| to_napi_error(format!("{name}: {e}")))
}

fn store(dataset_json: &str) -> NapiResult<InMemoryStore> {
    load_dataset(dataset_json).map_err(to_napi_error)
}

fn to_json(value: &impl Serialize) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Conversion rates
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_conversion_rate(
    dataset_json: String,
    emission_type_id: i64,
    location_id: i64,
    year: i32,
) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let rate = ConversionRateResolver::new(&store)
        .resolve(
            to_id(emission_type_id, "emission_type_id")?,
            to_id(location_id, "location_id")?,
            year,
        )
        .map_err(to_napi_error)?;
    to_json(&rate)
}

/// Returns `{ "rate": <saved rate>, "dataset": <updated dataset> }`.
#[napi]
pub fn upsert_conversion_rate(dataset_json: String, rate_json: String) -> NapiResult<String> {
    let mut store = store(&dataset_json)?;
    let input: ConversionRateInput = serde_json::from_str(&rate_json).map_err(to_napi_error)?;
    let saved = upsert(&mut store, &input).map_err(to_napi_error)?;
    to_json(&serde_json::json!({
        "rate": saved,
        "dataset": Dataset::from_store(&store),
    }))
}

// ---------------------------------------------------------------------------
// CO2e
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_co2e(dataset_json: String, record_json: String) -> NapiResult<f64> {
    let store = store(&dataset_json)?;
    let record: EmissionsData = serde_json::from_str(&record_json).map_err(to_napi_error)?;
    Co2eCalculator::new(&store)
        .calculate(&record)
        .map_err(to_napi_error)
}

#[napi]
pub fn total_co2e_for_location(dataset_json: String, location_id: i64) -> NapiResult<f64> {
    let store = store(&dataset_json)?;
    EmissionsAggregator::new(&store)
        .total_co2e(to_id(location_id, "location_id")?)
        .map_err(to_napi_error)
}

#[napi]
pub fn total_co2e_for_client(dataset_json: String, client_id: i64) -> NapiResult<f64> {
    let store = store(&dataset_json)?;
    EmissionsAggregator::new(&store)
        .total_co2e_for_client(to_id(client_id, "client_id")?)
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Emissions queries
// ---------------------------------------------------------------------------

#[napi]
pub fn all_emissions(dataset_json: String) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let records = EmissionsAggregator::new(&store)
        .all()
        .map_err(to_napi_error)?;
    to_json(&records)
}

#[napi]
pub fn emissions_for_location(dataset_json: String, location_id: i64) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let output = reports::location_report(&store, to_id(location_id, "location_id")?)
        .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn emissions_for_client(dataset_json: String, client_id: i64) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let output =
        reports::client_report(&store, to_id(client_id, "client_id")?).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn emissions_by_date_range(
    dataset_json: String,
    start: String,
    end: String,
    location_id: Option<i64>,
) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let location_id = location_id
        .map(|id| to_id(id, "location_id"))
        .transpose()?;
    let output = reports::date_range_report(
        &store,
        to_date(&start, "start")?,
        to_date(&end, "end")?,
        location_id,
    )
    .map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn emissions_summary_by_type(dataset_json: String, location_id: i64) -> NapiResult<String> {
    let store = store(&dataset_json)?;
    let output = reports::summary_report(&store, to_id(location_id, "location_id")?)
        .map_err(to_napi_error)?;
    to_json(&output)
}
