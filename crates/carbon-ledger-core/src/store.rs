//! Storage collaborator.
//!
//! The engine only talks to storage through [`EmissionsStore`]. Entities hold
//! foreign-key identifiers; the store owns the lookup indices (natural key of
//! conversion rates, locations per client, records per location).
//!
//! [`InMemoryStore`] is the bundled implementation. It enforces the same
//! constraints a relational schema would: foreign keys must resolve and the
//! `(emission_type_id, location_id, year)` triple of a conversion rate is
//! unique.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::error::CarbonLedgerError;
use crate::types::{
    Client, ClientId, ConversionRate, ConversionRateId, EmissionType, EmissionTypeId,
    EmissionsData, EmissionsDataId, Location, LocationId, RateKey, UNASSIGNED_ID,
};
use crate::CarbonLedgerResult;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait EmissionsStore {
    // -- Conversion rates --

    fn find_conversion_rate(
        &self,
        emission_type_id: EmissionTypeId,
        location_id: LocationId,
        year: i32,
    ) -> Option<ConversionRate>;

    fn find_conversion_rates_by_location(&self, location_id: LocationId) -> Vec<ConversionRate>;

    fn find_all_conversion_rates(&self) -> Vec<ConversionRate>;

    /// Insert when `rate.id` is unassigned, otherwise update by identity.
    fn save_conversion_rate(&mut self, rate: ConversionRate) -> CarbonLedgerResult<ConversionRate>;

    // -- Emissions data --

    fn find_emissions_data_by_location(&self, location_id: LocationId) -> Vec<EmissionsData>;

    fn find_emissions_data_by_location_in(&self, location_ids: &[LocationId])
        -> Vec<EmissionsData>;

    /// Records dated within `[start, end]`, optionally restricted to one
    /// location.
    fn find_emissions_data_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location_id: Option<LocationId>,
    ) -> Vec<EmissionsData>;

    fn find_all_emissions_data(&self) -> Vec<EmissionsData>;

    fn save_emissions_data(&mut self, data: EmissionsData) -> CarbonLedgerResult<EmissionsData>;

    // -- Locations, clients, emission types --

    fn find_locations_by_client(&self, client_id: ClientId) -> Vec<Location>;

    fn find_location(&self, id: LocationId) -> Option<Location>;

    fn find_all_locations(&self) -> Vec<Location>;

    fn save_location(&mut self, location: Location) -> CarbonLedgerResult<Location>;

    fn find_client(&self, id: ClientId) -> Option<Client>;

    fn find_all_clients(&self) -> Vec<Client>;

    fn save_client(&mut self, client: Client) -> CarbonLedgerResult<Client>;

    fn find_emission_type(&self, id: EmissionTypeId) -> Option<EmissionType>;

    fn find_all_emission_types(&self) -> Vec<EmissionType>;

    fn save_emission_type(&mut self, emission_type: EmissionType)
        -> CarbonLedgerResult<EmissionType>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    clients: BTreeMap<ClientId, Client>,
    locations: BTreeMap<LocationId, Location>,
    emission_types: BTreeMap<EmissionTypeId, EmissionType>,
    conversion_rates: BTreeMap<ConversionRateId, ConversionRate>,
    emissions_data: BTreeMap<EmissionsDataId, EmissionsData>,

    rate_index: HashMap<RateKey, ConversionRateId>,
    locations_by_client: HashMap<ClientId, BTreeSet<LocationId>>,
    data_by_location: HashMap<LocationId, BTreeSet<EmissionsDataId>>,
}

/// One past the highest id in `table`. Fails once the table holds `u64::MAX`
/// rather than wrapping back to [`UNASSIGNED_ID`].
fn next_id<V>(table_name: &str, table: &BTreeMap<u64, V>) -> CarbonLedgerResult<u64> {
    match table.keys().next_back() {
        None => Ok(1),
        Some(last) => last.checked_add(1).ok_or_else(|| CarbonLedgerError::InvalidInput {
            field: table_name.into(),
            reason: format!("no id left after {last}"),
        }),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversion_rate_count(&self) -> usize {
        self.conversion_rates.len()
    }

    pub fn emissions_data_count(&self) -> usize {
        self.emissions_data.len()
    }

    fn require_client(&self, id: ClientId) -> CarbonLedgerResult<()> {
        if self.clients.contains_key(&id) {
            Ok(())
        } else {
            Err(CarbonLedgerError::not_found("Client", id))
        }
    }

    fn require_location(&self, id: LocationId) -> CarbonLedgerResult<()> {
        if self.locations.contains_key(&id) {
            Ok(())
        } else {
            Err(CarbonLedgerError::not_found("Location", id))
        }
    }

    fn require_emission_type(&self, id: EmissionTypeId) -> CarbonLedgerResult<()> {
        if self.emission_types.contains_key(&id) {
            Ok(())
        } else {
            Err(CarbonLedgerError::not_found("EmissionType", id))
        }
    }

    fn collect_data<'a>(&self, ids: impl IntoIterator<Item = &'a EmissionsDataId>) -> Vec<EmissionsData> {
        ids.into_iter()
            .filter_map(|id| self.emissions_data.get(id).cloned())
            .collect()
    }
}

impl EmissionsStore for InMemoryStore {
    fn find_conversion_rate(
        &self,
        emission_type_id: EmissionTypeId,
        location_id: LocationId,
        year: i32,
    ) -> Option<ConversionRate> {
        let key = RateKey {
            emission_type_id,
            location_id,
            year,
        };
        self.rate_index
            .get(&key)
            .and_then(|id| self.conversion_rates.get(id))
            .cloned()
    }

    fn find_conversion_rates_by_location(&self, location_id: LocationId) -> Vec<ConversionRate> {
        self.conversion_rates
            .values()
            .filter(|r| r.location_id == location_id)
            .cloned()
            .collect()
    }

    fn find_all_conversion_rates(&self) -> Vec<ConversionRate> {
        self.conversion_rates.values().cloned().collect()
    }

    fn save_conversion_rate(
        &mut self,
        mut rate: ConversionRate,
    ) -> CarbonLedgerResult<ConversionRate> {
        self.require_emission_type(rate.emission_type_id)?;
        self.require_location(rate.location_id)?;

        let key = rate.key();
        if let Some(&owner) = self.rate_index.get(&key) {
            if owner != rate.id {
                return Err(CarbonLedgerError::DuplicateConversionRate {
                    emission_type_id: key.emission_type_id,
                    location_id: key.location_id,
                    year: key.year,
                });
            }
        }

        if rate.id == UNASSIGNED_ID {
            rate.id = next_id("conversion_rates", &self.conversion_rates)?;
        } else if let Some(previous) = self.conversion_rates.get(&rate.id) {
            let previous_key = previous.key();
            if previous_key != key {
                self.rate_index.remove(&previous_key);
            }
        }

        self.rate_index.insert(key, rate.id);
        self.conversion_rates.insert(rate.id, rate.clone());
        Ok(rate)
    }

    fn find_emissions_data_by_location(&self, location_id: LocationId) -> Vec<EmissionsData> {
        match self.data_by_location.get(&location_id) {
            Some(ids) => self.collect_data(ids),
            None => Vec::new(),
        }
    }

    fn find_emissions_data_by_location_in(
        &self,
        location_ids: &[LocationId],
    ) -> Vec<EmissionsData> {
        let wanted: BTreeSet<EmissionsDataId> = location_ids
            .iter()
            .filter_map(|loc| self.data_by_location.get(loc))
            .flatten()
            .copied()
            .collect();
        self.collect_data(&wanted)
    }

    fn find_emissions_data_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location_id: Option<LocationId>,
    ) -> Vec<EmissionsData> {
        self.emissions_data
            .values()
            .filter(|d| d.date >= start && d.date <= end)
            .filter(|d| location_id.map_or(true, |loc| d.location_id == loc))
            .cloned()
            .collect()
    }

    fn find_all_emissions_data(&self) -> Vec<EmissionsData> {
        self.emissions_data.values().cloned().collect()
    }

    fn save_emissions_data(
        &mut self,
        mut data: EmissionsData,
    ) -> CarbonLedgerResult<EmissionsData> {
        self.require_emission_type(data.emission_type_id)?;
        self.require_location(data.location_id)?;

        if data.id == UNASSIGNED_ID {
            data.id = next_id("emissions_data", &self.emissions_data)?;
        } else if let Some(previous) = self.emissions_data.get(&data.id) {
            if previous.location_id != data.location_id {
                if let Some(ids) = self.data_by_location.get_mut(&previous.location_id) {
                    ids.remove(&data.id);
                }
            }
        }

        self.data_by_location
            .entry(data.location_id)
            .or_default()
            .insert(data.id);
        self.emissions_data.insert(data.id, data.clone());
        Ok(data)
    }

    fn find_locations_by_client(&self, client_id: ClientId) -> Vec<Location> {
        self.locations_by_client
            .get(&client_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.locations.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_location(&self, id: LocationId) -> Option<Location> {
        self.locations.get(&id).cloned()
    }

    fn find_all_locations(&self) -> Vec<Location> {
        self.locations.values().cloned().collect()
    }

    fn save_location(&mut self, mut location: Location) -> CarbonLedgerResult<Location> {
        self.require_client(location.client_id)?;

        if location.id == UNASSIGNED_ID {
            location.id = next_id("locations", &self.locations)?;
        } else if let Some(previous) = self.locations.get(&location.id) {
            if previous.client_id != location.client_id {
                if let Some(ids) = self.locations_by_client.get_mut(&previous.client_id) {
                    ids.remove(&location.id);
                }
            }
        }

        self.locations_by_client
            .entry(location.client_id)
            .or_default()
            .insert(location.id);
        self.locations.insert(location.id, location.clone());
        Ok(location)
    }

    fn find_client(&self, id: ClientId) -> Option<Client> {
        self.clients.get(&id).cloned()
    }

    fn find_all_clients(&self) -> Vec<Client> {
        self.clients.values().cloned().collect()
    }

    fn save_client(&mut self, mut client: Client) -> CarbonLedgerResult<Client> {
        if client.id == UNASSIGNED_ID {
            client.id = next_id("clients", &self.clients)?;
        }
        self.clients.insert(client.id, client.clone());
        Ok(client)
    }

    fn find_emission_type(&self, id: EmissionTypeId) -> Option<EmissionType> {
        self.emission_types.get(&id).cloned()
    }

    fn find_all_emission_types(&self) -> Vec<EmissionType> {
        self.emission_types.values().cloned().collect()
    }

    fn save_emission_type(
        &mut self,
        mut emission_type: EmissionType,
    ) -> CarbonLedgerResult<EmissionType> {
        if emission_type.id == UNASSIGNED_ID {
            emission_type.id = next_id("emission_types", &self.emission_types)?;
        }
        self.emission_types
            .insert(emission_type.id, emission_type.clone());
        Ok(emission_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store
            .save_client(Client {
                id: UNASSIGNED_ID,
                name: "Version 1".into(),
            })
            .unwrap();
        store
            .save_location(Location {
                id: UNASSIGNED_ID,
                name: "Dublin Office".into(),
                region: "EU".into(),
                client_id: 1,
            })
            .unwrap();
        store
            .save_emission_type(EmissionType {
                id: UNASSIGNED_ID,
                name: "Electricity".into(),
                unit: "kWh".into(),
                scope: "Scope 2".into(),
                description: String::new(),
            })
            .unwrap();
        store
    }

    fn rate(year: i32, factor: f64) -> ConversionRate {
        ConversionRate {
            id: UNASSIGNED_ID,
            rate: factor,
            unit: "kgCO2e/kWh".into(),
            description: String::new(),
            year,
            emission_type_id: 1,
            location_id: 1,
        }
    }

    #[test]
    fn test_ids_assigned_sequentially() {
        let mut store = seeded();
        let a = store.save_conversion_rate(rate(2023, 0.3)).unwrap();
        let b = store.save_conversion_rate(rate(2024, 0.2)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn test_duplicate_natural_key_rejected() {
        let mut store = seeded();
        store.save_conversion_rate(rate(2024, 0.3)).unwrap();
        let err = store.save_conversion_rate(rate(2024, 0.4)).unwrap_err();
        assert!(matches!(
            err,
            CarbonLedgerError::DuplicateConversionRate { year: 2024, .. }
        ));
        assert_eq!(store.conversion_rate_count(), 1);
    }

    #[test]
    fn test_update_by_identity_moves_index() {
        let mut store = seeded();
        let mut saved = store.save_conversion_rate(rate(2023, 0.3)).unwrap();
        saved.year = 2025;
        store.save_conversion_rate(saved).unwrap();
        assert!(store.find_conversion_rate(1, 1, 2023).is_none());
        assert!(store.find_conversion_rate(1, 1, 2025).is_some());
    }

    #[test]
    fn test_dangling_foreign_keys_rejected() {
        let mut store = seeded();
        let mut bad = rate(2024, 0.3);
        bad.location_id = 99;
        assert!(matches!(
            store.save_conversion_rate(bad),
            Err(CarbonLedgerError::EntityNotFound { entity: "Location", id: 99 })
        ));

        let orphan = Location {
            id: UNASSIGNED_ID,
            name: "Nowhere".into(),
            region: "??".into(),
            client_id: 42,
        };
        assert!(store.save_location(orphan).is_err());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut store = seeded();
        for (i, d) in [date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 31)]
            .into_iter()
            .enumerate()
        {
            store
                .save_emissions_data(EmissionsData {
                    id: UNASSIGNED_ID,
                    date: d,
                    value: i as f64,
                    emission_type_id: 1,
                    location_id: 1,
                })
                .unwrap();
        }
        let found = store.find_emissions_data_by_date_range(date(2024, 1, 1), date(2024, 1, 31), None);
        assert_eq!(found.len(), 3);
        let found = store.find_emissions_data_by_date_range(date(2024, 1, 15), date(2024, 1, 15), Some(1));
        assert_eq!(found.len(), 1);
        let found = store.find_emissions_data_by_date_range(date(2024, 1, 1), date(2024, 1, 31), Some(2));
        assert!(found.is_empty());
    }

    #[test]
    fn test_id_space_exhausted() {
        let mut store = seeded();
        let last = EmissionsData {
            id: u64::MAX,
            date: date(2024, 1, 1),
            value: 1.0,
            emission_type_id: 1,
            location_id: 1,
        };
        store.save_emissions_data(last.clone()).unwrap();
        let err = store
            .save_emissions_data(EmissionsData {
                id: UNASSIGNED_ID,
                ..last
            })
            .unwrap_err();
        assert!(matches!(err, CarbonLedgerError::InvalidInput { .. }));
        assert_eq!(store.emissions_data_count(), 1);
        assert!(store.find_all_emissions_data().iter().all(|d| d.id != UNASSIGNED_ID));
    }

    #[test]
    fn test_locations_by_client_index() {
        let mut store = seeded();
        store
            .save_client(Client {
                id: UNASSIGNED_ID,
                name: "Acme".into(),
            })
            .unwrap();
        let mut moved = store.find_location(1).unwrap();
        moved.client_id = 2;
        store.save_location(moved).unwrap();
        assert!(store.find_locations_by_client(1).is_empty());
        assert_eq!(store.find_locations_by_client(2).len(), 1);
    }
}
