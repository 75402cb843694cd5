//! Conversion rate resolution and maintenance.
//!
//! A conversion rate is keyed by `(emission type, location, year)`. Lookups
//! are exact: a miss is reported as [`CarbonLedgerError::ConversionRateNotFound`]
//! and never answered with a neighbouring year.

use tracing::{debug, info};

use crate::error::CarbonLedgerError;
use crate::store::EmissionsStore;
use crate::types::{
    ConversionRate, ConversionRateInput, EmissionTypeId, LocationId, UNASSIGNED_ID,
};
use crate::CarbonLedgerResult;

/// Read-only view over the conversion rates held by a store.
pub struct ConversionRateResolver<'a, S: EmissionsStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EmissionsStore + ?Sized> ConversionRateResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The unique rate for the exact `(emission type, location, year)` triple.
    pub fn resolve(
        &self,
        emission_type_id: EmissionTypeId,
        location_id: LocationId,
        year: i32,
    ) -> CarbonLedgerResult<ConversionRate> {
        debug!(emission_type_id, location_id, year, "resolving conversion rate");
        self.store
            .find_conversion_rate(emission_type_id, location_id, year)
            .ok_or(CarbonLedgerError::ConversionRateNotFound {
                emission_type_id,
                location_id,
                year,
            })
    }

    pub fn rates_for_location(&self, location_id: LocationId) -> Vec<ConversionRate> {
        self.store.find_conversion_rates_by_location(location_id)
    }

    pub fn all_rates(&self) -> Vec<ConversionRate> {
        self.store.find_all_conversion_rates()
    }
}

/// Insert a conversion rate, or update the existing one for the same
/// `(emission type, location, year)`.
///
/// On update only `rate`, `unit` and `description` change; the stored
/// identity is kept. Both references must be present and must exist in the
/// store, otherwise nothing is written.
pub fn upsert_conversion_rate<S: EmissionsStore + ?Sized>(
    store: &mut S,
    input: &ConversionRateInput,
) -> CarbonLedgerResult<ConversionRate> {
    let (emission_type_id, location_id) = match (input.emission_type_id, input.location_id) {
        (Some(et), Some(loc)) => (et, loc),
        _ => {
            return Err(CarbonLedgerError::InvalidConversionRate(
                "EmissionType and Location must be provided".into(),
            ))
        }
    };
    if store.find_emission_type(emission_type_id).is_none() {
        return Err(CarbonLedgerError::InvalidConversionRate(format!(
            "EmissionType {emission_type_id} does not exist"
        )));
    }
    if store.find_location(location_id).is_none() {
        return Err(CarbonLedgerError::InvalidConversionRate(format!(
            "Location {location_id} does not exist"
        )));
    }
    if !input.rate.is_finite() {
        return Err(CarbonLedgerError::InvalidConversionRate(format!(
            "rate must be a finite number, got {}",
            input.rate
        )));
    }

    let rate = match store.find_conversion_rate(emission_type_id, location_id, input.year) {
        Some(mut existing) => {
            info!(
                id = existing.id,
                emission_type_id,
                location_id,
                year = input.year,
                old_rate = existing.rate,
                new_rate = input.rate,
                "updating conversion rate"
            );
            existing.rate = input.rate;
            existing.unit = input.unit.clone();
            existing.description = input.description.clone();
            existing
        }
        None => {
            info!(
                emission_type_id,
                location_id,
                year = input.year,
                rate = input.rate,
                "inserting conversion rate"
            );
            ConversionRate {
                id: UNASSIGNED_ID,
                rate: input.rate,
                unit: input.unit.clone(),
                description: input.description.clone(),
                year: input.year,
                emission_type_id,
                location_id,
            }
        }
    };

    store.save_conversion_rate(rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Client, EmissionType, Location};

    fn store() -> InMemoryStore {
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
                name: "Natural Gas".into(),
                unit: "kWh".into(),
                scope: "Scope 1".into(),
                description: "Boiler gas".into(),
            })
            .unwrap();
        store
    }

    fn input(year: i32, rate: f64) -> ConversionRateInput {
        ConversionRateInput {
            rate,
            unit: "kgCO2e/kWh".into(),
            description: "SEAI factor".into(),
            year,
            emission_type_id: Some(1),
            location_id: Some(1),
        }
    }

    #[test]
    fn test_resolve_missing_rate() {
        let store = store();
        let err = ConversionRateResolver::new(&store)
            .resolve(1, 1, 2024)
            .unwrap_err();
        assert!(matches!(
            err,
            CarbonLedgerError::ConversionRateNotFound {
                emission_type_id: 1,
                location_id: 1,
                year: 2024
            }
        ));
    }

    #[test]
    fn test_resolve_does_not_fall_back_to_other_year() {
        let mut store = store();
        upsert_conversion_rate(&mut store, &input(2023, 0.2)).unwrap();
        let resolver = ConversionRateResolver::new(&store);
        assert!(resolver.resolve(1, 1, 2023).is_ok());
        assert!(resolver.resolve(1, 1, 2024).is_err());
    }

    #[test]
    fn test_upsert_then_resolve_round_trip() {
        let mut store = store();
        let saved = upsert_conversion_rate(&mut store, &input(2024, 0.184)).unwrap();
        let resolved = ConversionRateResolver::new(&store)
            .resolve(1, 1, 2024)
            .unwrap();
        assert_eq!(saved, resolved);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut store = store();
        let first = upsert_conversion_rate(&mut store, &input(2024, 0.5)).unwrap();
        let mut changed = input(2024, 0.75);
        changed.description = "revised".into();
        let second = upsert_conversion_rate(&mut store, &changed).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.conversion_rate_count(), 1);
        let resolved = ConversionRateResolver::new(&store)
            .resolve(1, 1, 2024)
            .unwrap();
        assert_eq!(resolved.rate, 0.75);
        assert_eq!(resolved.description, "revised");
    }

    #[test]
    fn test_upsert_missing_reference_rejected() {
        let mut store = store();
        let mut no_location = input(2024, 0.5);
        no_location.location_id = None;
        assert!(matches!(
            upsert_conversion_rate(&mut store, &no_location),
            Err(CarbonLedgerError::InvalidConversionRate(_))
        ));

        let mut no_type = input(2024, 0.5);
        no_type.emission_type_id = None;
        assert!(matches!(
            upsert_conversion_rate(&mut store, &no_type),
            Err(CarbonLedgerError::InvalidConversionRate(_))
        ));
        assert_eq!(store.conversion_rate_count(), 0);
    }

    #[test]
    fn test_upsert_unknown_reference_rejected() {
        let mut store = store();
        let mut dangling = input(2024, 0.5);
        dangling.emission_type_id = Some(7);
        assert!(matches!(
            upsert_conversion_rate(&mut store, &dangling),
            Err(CarbonLedgerError::InvalidConversionRate(_))
        ));
        assert_eq!(store.conversion_rate_count(), 0);
    }

    #[test]
    fn test_upsert_non_finite_rate_rejected() {
        let mut store = store();
        assert!(upsert_conversion_rate(&mut store, &input(2024, f64::NAN)).is_err());
        assert_eq!(store.conversion_rate_count(), 0);
    }

    #[test]
    fn test_rates_for_location() {
        let mut store = store();
        upsert_conversion_rate(&mut store, &input(2023, 0.2)).unwrap();
        upsert_conversion_rate(&mut store, &input(2024, 0.3)).unwrap();
        let resolver = ConversionRateResolver::new(&store);
        assert_eq!(resolver.rates_for_location(1).len(), 2);
        assert!(resolver.rates_for_location(2).is_empty());
        assert_eq!(resolver.all_rates().len(), 2);
    }
}
