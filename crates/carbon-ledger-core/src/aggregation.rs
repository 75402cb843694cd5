//! Emissions aggregation.
//!
//! Every query follows the same path: fetch raw records from the store,
//! enrich each one with its location, emission type and CO2e, then fold.
//! Enrichment is all-or-nothing; one record without a conversion rate fails
//! the whole query.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::calculator::Co2eCalculator;
use crate::error::CarbonLedgerError;
use crate::store::EmissionsStore;
use crate::types::{
    ClientId, Co2e, EmissionType, EmissionTypeId, EmissionsData, EmissionsRecord,
    EmissionsSummary, Location, LocationId,
};
use crate::CarbonLedgerResult;

pub struct EmissionsAggregator<'a, S: EmissionsStore + ?Sized> {
    store: &'a S,
    calculator: Co2eCalculator<'a, S>,
}

impl<'a, S: EmissionsStore + ?Sized> EmissionsAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            calculator: Co2eCalculator::new(store),
        }
    }

    /// Join each record with its location and emission type and compute its
    /// CO2e. Fails on the first record that cannot be enriched.
    pub fn enrich(&self, records: &[EmissionsData]) -> CarbonLedgerResult<Vec<EmissionsRecord>> {
        let mut locations: HashMap<LocationId, Location> = HashMap::new();
        let mut types: HashMap<EmissionTypeId, EmissionType> = HashMap::new();

        records
            .iter()
            .map(|data| -> CarbonLedgerResult<EmissionsRecord> {
                if !locations.contains_key(&data.location_id) {
                    let location = self
                        .store
                        .find_location(data.location_id)
                        .ok_or_else(|| CarbonLedgerError::not_found("Location", data.location_id))?;
                    locations.insert(data.location_id, location);
                }
                if !types.contains_key(&data.emission_type_id) {
                    let emission_type = self
                        .store
                        .find_emission_type(data.emission_type_id)
                        .ok_or_else(|| {
                            CarbonLedgerError::not_found("EmissionType", data.emission_type_id)
                        })?;
                    types.insert(data.emission_type_id, emission_type);
                }
                let location = &locations[&data.location_id];
                let emission_type = &types[&data.emission_type_id];

                let co2e = self.calculator.calculate(data)?;

                Ok(EmissionsRecord {
                    id: data.id,
                    date: data.date,
                    value: data.value,
                    co2e,
                    location_id: location.id,
                    location_name: location.name.clone(),
                    location_region: location.region.clone(),
                    emission_type_id: emission_type.id,
                    emission_type_name: emission_type.name.clone(),
                    unit: emission_type.unit.clone(),
                    scope: emission_type.scope.clone(),
                })
            })
            .collect()
    }

    pub fn by_location(&self, location_id: LocationId) -> CarbonLedgerResult<Vec<EmissionsRecord>> {
        let records = self.store.find_emissions_data_by_location(location_id);
        debug!(location_id, records = records.len(), "emissions by location");
        self.enrich(&records)
    }

    /// Records at any location owned by the client. A client without
    /// locations has no records.
    pub fn by_client(&self, client_id: ClientId) -> CarbonLedgerResult<Vec<EmissionsRecord>> {
        let location_ids: Vec<LocationId> = self
            .store
            .find_locations_by_client(client_id)
            .iter()
            .map(|l| l.id)
            .collect();
        if location_ids.is_empty() {
            debug!(client_id, "client has no locations");
            return Ok(Vec::new());
        }
        let records = self.store.find_emissions_data_by_location_in(&location_ids);
        debug!(
            client_id,
            locations = location_ids.len(),
            records = records.len(),
            "emissions by client"
        );
        self.enrich(&records)
    }

    /// Records dated within `[start, end]`, optionally at one location.
    pub fn by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location_id: Option<LocationId>,
    ) -> CarbonLedgerResult<Vec<EmissionsRecord>> {
        if start > end {
            return Err(CarbonLedgerError::InvalidRange { start, end });
        }
        let records = self
            .store
            .find_emissions_data_by_date_range(start, end, location_id);
        debug!(%start, %end, ?location_id, records = records.len(), "emissions by date range");
        self.enrich(&records)
    }

    pub fn all(&self) -> CarbonLedgerResult<Vec<EmissionsRecord>> {
        self.enrich(&self.store.find_all_emissions_data())
    }

    pub fn total_co2e(&self, location_id: LocationId) -> CarbonLedgerResult<Co2e> {
        Ok(sum_co2e(&self.by_location(location_id)?))
    }

    pub fn total_co2e_for_client(&self, client_id: ClientId) -> CarbonLedgerResult<Co2e> {
        Ok(sum_co2e(&self.by_client(client_id)?))
    }

    /// Per emission-type totals for a location, keyed by emission type name.
    pub fn summary_by_type(
        &self,
        location_id: LocationId,
    ) -> CarbonLedgerResult<HashMap<String, EmissionsSummary>> {
        Ok(summarize_by_type(&self.by_location(location_id)?))
    }
}

pub fn sum_co2e(records: &[EmissionsRecord]) -> Co2e {
    records.iter().map(|r| r.co2e).sum()
}

/// Group by emission type name (exact match). The unit of a group is taken
/// from its first record; units are not cross-checked within a group.
pub fn summarize_by_type(records: &[EmissionsRecord]) -> HashMap<String, EmissionsSummary> {
    let mut summary: HashMap<String, EmissionsSummary> = HashMap::new();
    for record in records {
        let entry = summary
            .entry(record.emission_type_name.clone())
            .or_insert_with(|| EmissionsSummary {
                unit: record.unit.clone(),
                ..EmissionsSummary::default()
            });
        entry.total_value += record.value;
        entry.total_co2e += record.co2e;
        entry.count += 1;
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
