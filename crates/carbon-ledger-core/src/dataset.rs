//! JSON dataset loading and export.
//!
//! A dataset is a single document holding every table. Loading replays it
//! into an [`InMemoryStore`] in dependency order (clients, emission types,
//! locations, conversion rates, emissions data) so that every foreign key and
//! the conversion-rate natural key are checked exactly as the store checks
//! them for live writes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CarbonLedgerError;
use crate::store::{EmissionsStore, InMemoryStore};
use crate::types::{Client, ConversionRate, EmissionType, EmissionsData, Location, UNASSIGNED_ID};
use crate::CarbonLedgerResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub emission_types: Vec<EmissionType>,
    #[serde(default)]
    pub conversion_rates: Vec<ConversionRate>,
    #[serde(default)]
    pub emissions_data: Vec<EmissionsData>,
}

/// Reject repeated explicit ids within one table. Unassigned ids are fine.
fn check_unique_ids(table: &str, ids: impl Iterator<Item = u64>) -> CarbonLedgerResult<()> {
    let mut seen = HashSet::new();
    for id in ids.filter(|id| *id != UNASSIGNED_ID) {
        if !seen.insert(id) {
            return Err(CarbonLedgerError::InvalidInput {
                field: table.into(),
                reason: format!("duplicate id {id}"),
            });
        }
    }
    Ok(())
}

/// Rows carrying an explicit id come first so that ids handed out to the
/// unassigned rows never collide with an id later in the same table.
fn explicit_ids_first<T>(rows: Vec<T>, id: impl Fn(&T) -> u64) -> impl Iterator<Item = T> {
    let (explicit, unassigned): (Vec<T>, Vec<T>) =
        rows.into_iter().partition(|row| id(row) != UNASSIGNED_ID);
    explicit.into_iter().chain(unassigned)
}

impl Dataset {
    pub fn from_json(json: &str) -> CarbonLedgerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> CarbonLedgerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Snapshot every table of a store.
    pub fn from_store<S: EmissionsStore + ?Sized>(store: &S) -> Self {
        Dataset {
            clients: store.find_all_clients(),
            locations: store.find_all_locations(),
            emission_types: store.find_all_emission_types(),
            conversion_rates: store.find_all_conversion_rates(),
            emissions_data: store.find_all_emissions_data(),
        }
    }

    /// Load into a fresh store, validating references and keys.
    pub fn into_store(self) -> CarbonLedgerResult<InMemoryStore> {
        check_unique_ids("clients", self.clients.iter().map(|c| c.id))?;
        check_unique_ids("locations", self.locations.iter().map(|l| l.id))?;
        check_unique_ids("emission_types", self.emission_types.iter().map(|t| t.id))?;
        check_unique_ids("conversion_rates", self.conversion_rates.iter().map(|r| r.id))?;
        check_unique_ids("emissions_data", self.emissions_data.iter().map(|d| d.id))?;

        if let Some(bad) = self.conversion_rates.iter().find(|r| !r.rate.is_finite()) {
            return Err(CarbonLedgerError::InvalidInput {
                field: "conversion_rates".into(),
                reason: format!("rate for year {} is not a finite number", bad.year),
            });
        }
        if let Some(bad) = self.emissions_data.iter().find(|d| !d.value.is_finite()) {
            return Err(CarbonLedgerError::InvalidInput {
                field: "emissions_data".into(),
                reason: format!("value dated {} is not a finite number", bad.date),
            });
        }

        let mut store = InMemoryStore::new();
        let counts = (
            self.clients.len(),
            self.locations.len(),
            self.emission_types.len(),
            self.conversion_rates.len(),
            self.emissions_data.len(),
        );

        for client in explicit_ids_first(self.clients, |c| c.id) {
            store.save_client(client)?;
        }
        for emission_type in explicit_ids_first(self.emission_types, |t| t.id) {
            store.save_emission_type(emission_type)?;
        }
        for location in explicit_ids_first(self.locations, |l| l.id) {
            store.save_location(location)?;
        }
        for rate in explicit_ids_first(self.conversion_rates, |r| r.id) {
            store.save_conversion_rate(rate)?;
        }
        for data in explicit_ids_first(self.emissions_data, |d| d.id) {
            if store
                .find_conversion_rate(data.emission_type_id, data.location_id, data.year())
                .is_none()
            {
                warn!(
                    emission_type_id = data.emission_type_id,
                    location_id = data.location_id,
                    year = data.year(),
                    "emissions record has no conversion rate; queries covering it will fail"
                );
            }
            store.save_emissions_data(data)?;
        }

        info!(
            clients = counts.0,
            locations = counts.1,
            emission_types = counts.2,
            conversion_rates = counts.3,
            emissions_data = counts.4,
            "dataset loaded"
        );
        Ok(store)
    }
}

/// Parse a JSON dataset and load it into a store.
pub fn load_dataset(json: &str) -> CarbonLedgerResult<InMemoryStore> {
    Dataset::from_json(json)?.into_store()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ConversionRateResolver;

    const SAMPLE: &str = r#"{
        "clients": [{ "id": 1, "name": "Version 1" }],
        "locations": [
            { "id": 1, "name": "Dublin Office", "region": "EU", "client_id": 1 }
        ],
        "emission_types": [
            { "id": 1, "name": "Electricity", "unit": "kWh", "scope": "Scope 2" }
        ],
        "conversion_rates": [
            { "id": 1, "rate": 0.2263, "unit": "kgCO2e/kWh", "year": 2024,
              "emission_type_id": 1, "location_id": 1 }
        ],
        "emissions_data": [
            { "id": 1, "date": "2024-01-31", "value": 1200.0,
              "emission_type_id": 1, "location_id": 1 }
        ]
    }"#;

    #[test]
    fn test_load_sample() {
        let store = load_dataset(SAMPLE).unwrap();
        let rate = ConversionRateResolver::new(&store)
            .resolve(1, 1, 2024)
            .unwrap();
        assert_eq!(rate.rate, 0.2263);
        assert_eq!(rate.description, "");
        assert_eq!(store.emissions_data_count(), 1);
    }

    #[test]
    fn test_dangling_location_rejected() {
        let json = SAMPLE.replace(r#""client_id": 1"#, r#""client_id": 9"#);
        assert!(matches!(
            load_dataset(&json),
            Err(CarbonLedgerError::EntityNotFound { entity: "Client", id: 9 })
        ));
    }

    #[test]
    fn test_duplicate_rate_key_rejected() {
        let mut dataset = Dataset::from_json(SAMPLE).unwrap();
        let mut copy = dataset.conversion_rates[0].clone();
        copy.id = 2;
        dataset.conversion_rates.push(copy);
        assert!(matches!(
            dataset.into_store(),
            Err(CarbonLedgerError::DuplicateConversionRate { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut dataset = Dataset::from_json(SAMPLE).unwrap();
        let dup = dataset.clients[0].clone();
        dataset.clients.push(dup);
        assert!(matches!(
            dataset.into_store(),
            Err(CarbonLedgerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_unassigned_ids_do_not_overwrite_explicit_ones() {
        let mut dataset = Dataset::from_json(SAMPLE).unwrap();
        let explicit = dataset.emissions_data[0].clone();
        dataset.emissions_data = vec![
            EmissionsData {
                id: UNASSIGNED_ID,
                value: 100.0,
                ..explicit.clone()
            },
            EmissionsData {
                id: 1,
                value: 200.0,
                ..explicit
            },
        ];
        let mut extra_rate = dataset.conversion_rates[0].clone();
        extra_rate.id = UNASSIGNED_ID;
        extra_rate.year = 2023;
        dataset.conversion_rates.insert(0, extra_rate);

        let store = dataset.into_store().unwrap();
        let values: Vec<(u64, f64)> = store
            .find_all_emissions_data()
            .iter()
            .map(|d| (d.id, d.value))
            .collect();
        assert_eq!(values, vec![(1, 200.0), (2, 100.0)]);
        assert_eq!(store.conversion_rate_count(), 2);
        assert_eq!(store.find_conversion_rate(1, 1, 2023).unwrap().id, 2);
        assert_eq!(store.find_conversion_rate(1, 1, 2024).unwrap().id, 1);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            load_dataset("{ not json"),
            Err(CarbonLedgerError::SerializationError(_))
        ));
    }

    #[test]
    fn test_export_round_trip() {
        let store = load_dataset(SAMPLE).unwrap();
        let exported = Dataset::from_store(&store);
        let reloaded = Dataset::from_json(&exported.to_json().unwrap())
            .unwrap()
            .into_store()
            .unwrap();
        assert_eq!(
            Dataset::from_store(&reloaded).conversion_rates,
            exported.conversion_rates
        );
    }
}
