//! Aggregator queries wrapped in the computation envelope.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregation::{sum_co2e, summarize_by_type, EmissionsAggregator};
use crate::registry::{get_client, get_location};
use crate::store::EmissionsStore;
use crate::types::{
    with_metadata, ClientId, Co2e, ComputationOutput, EmissionsRecord, EmissionsSummary,
    LocationId,
};
use crate::CarbonLedgerResult;

const CO2E_FORMULA: &str = "co2e = value * rate(emission_type, location, year(date))";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionsReport {
    pub record_count: usize,
    pub total_co2e: Co2e,
    pub records: Vec<EmissionsRecord>,
}

impl EmissionsReport {
    fn new(records: Vec<EmissionsRecord>) -> Self {
        EmissionsReport {
            record_count: records.len(),
            total_co2e: sum_co2e(&records),
            records,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub location_id: LocationId,
    pub location_name: String,
    pub total_co2e: Co2e,
    /// Keyed by emission type name, sorted.
    pub by_type: BTreeMap<String, EmissionsSummary>,
}

fn empty_warning(warnings: &mut Vec<String>, report: &EmissionsReport, scope: &str) {
    if report.records.is_empty() {
        warnings.push(format!("No emissions records found for {scope}."));
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn location_report<S: EmissionsStore + ?Sized>(
    store: &S,
    location_id: LocationId,
) -> CarbonLedgerResult<ComputationOutput<EmissionsReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let location = get_location(store, location_id)?;
    let report = EmissionsReport::new(EmissionsAggregator::new(store).by_location(location_id)?);
    empty_warning(&mut warnings, &report, &format!("location '{}'", location.name));

    let assumptions = serde_json::json!({
        "location_id": location_id,
        "location_name": location.name,
        "co2e_formula": CO2E_FORMULA,
    });

    Ok(with_metadata(
        "Emissions by location",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}

pub fn client_report<S: EmissionsStore + ?Sized>(
    store: &S,
    client_id: ClientId,
) -> CarbonLedgerResult<ComputationOutput<EmissionsReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let client = get_client(store, client_id)?;
    let location_count = store.find_locations_by_client(client_id).len();
    if location_count == 0 {
        warnings.push(format!("Client '{}' has no locations.", client.name));
    }
    let report = EmissionsReport::new(EmissionsAggregator::new(store).by_client(client_id)?);
    if location_count > 0 {
        empty_warning(&mut warnings, &report, &format!("client '{}'", client.name));
    }

    let assumptions = serde_json::json!({
        "client_id": client_id,
        "client_name": client.name,
        "locations": location_count,
        "co2e_formula": CO2E_FORMULA,
    });

    Ok(with_metadata(
        "Emissions by client (all owned locations)",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}

pub fn date_range_report<S: EmissionsStore + ?Sized>(
    store: &S,
    start_date: NaiveDate,
    end_date: NaiveDate,
    location_id: Option<LocationId>,
) -> CarbonLedgerResult<ComputationOutput<EmissionsReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let records =
        EmissionsAggregator::new(store).by_date_range(start_date, end_date, location_id)?;
    let report = EmissionsReport::new(records);
    empty_warning(
        &mut warnings,
        &report,
        &format!("{start_date} to {end_date}"),
    );

    let assumptions = serde_json::json!({
        "start": start_date,
        "end": end_date,
        "bounds": "inclusive",
        "location_id": location_id,
        "co2e_formula": CO2E_FORMULA,
    });

    Ok(with_metadata(
        "Emissions by date range",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}

/// Per emission-type summary for a location. Groups whose records carry more
/// than one unit are reported in `warnings`; the group keeps the unit of its
/// first record.
pub fn summary_report<S: EmissionsStore + ?Sized>(
    store: &S,
    location_id: LocationId,
) -> CarbonLedgerResult<ComputationOutput<SummaryReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let location = get_location(store, location_id)?;
    let records = EmissionsAggregator::new(store).by_location(location_id)?;
    if records.is_empty() {
        warnings.push(format!(
            "No emissions records found for location '{}'.",
            location.name
        ));
    }

    let mut units: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for r in &records {
        units
            .entry(r.emission_type_name.as_str())
            .or_default()
            .insert(r.unit.as_str());
    }
    for (name, seen) in &units {
        if seen.len() > 1 {
            let listed: Vec<&str> = seen.iter().copied().collect();
            warnings.push(format!(
                "Emission type '{}' mixes units ({}); totals use the first unit seen.",
                name,
                listed.join(", ")
            ));
        }
    }

    let by_type: BTreeMap<String, EmissionsSummary> =
        summarize_by_type(&records).into_iter().collect();
    let result = SummaryReport {
        location_id,
        location_name: location.name.clone(),
        total_co2e: sum_co2e(&records),
        by_type,
    };

    let assumptions = serde_json::json!({
        "location_id": location_id,
        "grouping": "emission type name, case-sensitive",
        "unit": "first record of each group",
        "co2e_formula": CO2E_FORMULA,
    });

    Ok(with_metadata(
        "Emissions summary by type",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
