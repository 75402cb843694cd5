//! Lookup and creation helpers for clients, locations, emission types and
//! emissions records.

use chrono::NaiveDate;
use tracing::info;

use crate::conversion::ConversionRateResolver;
use crate::error::CarbonLedgerError;
use crate::store::EmissionsStore;
use crate::types::{
    Client, ClientId, EmissionType, EmissionTypeId, EmissionsData, Location, LocationId,
    UNASSIGNED_ID,
};
use crate::CarbonLedgerResult;

fn require_non_empty(field: &str, value: &str) -> CarbonLedgerResult<()> {
    if value.trim().is_empty() {
        return Err(CarbonLedgerError::InvalidInput {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

pub fn get_client<S: EmissionsStore + ?Sized>(store: &S, id: ClientId) -> CarbonLedgerResult<Client> {
    store
        .find_client(id)
        .ok_or_else(|| CarbonLedgerError::not_found("Client", id))
}

pub fn all_clients<S: EmissionsStore + ?Sized>(store: &S) -> Vec<Client> {
    store.find_all_clients()
}

pub fn add_client<S: EmissionsStore + ?Sized>(store: &mut S, name: &str) -> CarbonLedgerResult<Client> {
    require_non_empty("name", name)?;
    let client = store.save_client(Client {
        id: UNASSIGNED_ID,
        name: name.to_string(),
    })?;
    info!(id = client.id, name = %client.name, "added client");
    Ok(client)
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

pub fn get_location<S: EmissionsStore + ?Sized>(
    store: &S,
    id: LocationId,
) -> CarbonLedgerResult<Location> {
    store
        .find_location(id)
        .ok_or_else(|| CarbonLedgerError::not_found("Location", id))
}

pub fn locations_for_client<S: EmissionsStore + ?Sized>(store: &S, client_id: ClientId) -> Vec<Location> {
    store.find_locations_by_client(client_id)
}

pub fn all_locations<S: EmissionsStore + ?Sized>(store: &S) -> Vec<Location> {
    store.find_all_locations()
}

/// Create a location under an existing client.
pub fn add_location<S: EmissionsStore + ?Sized>(
    store: &mut S,
    client_id: ClientId,
    name: &str,
    region: &str,
) -> CarbonLedgerResult<Location> {
    get_client(&*store, client_id)?;
    require_non_empty("name", name)?;
    let location = store.save_location(Location {
        id: UNASSIGNED_ID,
        name: name.to_string(),
        region: region.to_string(),
        client_id,
    })?;
    info!(id = location.id, client_id, name = %location.name, "added location");
    Ok(location)
}

// ---------------------------------------------------------------------------
// Emission types
// ---------------------------------------------------------------------------

pub fn get_emission_type<S: EmissionsStore + ?Sized>(
    store: &S,
    id: EmissionTypeId,
) -> CarbonLedgerResult<EmissionType> {
    store
        .find_emission_type(id)
        .ok_or_else(|| CarbonLedgerError::not_found("EmissionType", id))
}

pub fn all_emission_types<S: EmissionsStore + ?Sized>(store: &S) -> Vec<EmissionType> {
    store.find_all_emission_types()
}

pub fn add_emission_type<S: EmissionsStore + ?Sized>(
    store: &mut S,
    name: &str,
    unit: &str,
    scope: &str,
    description: &str,
) -> CarbonLedgerResult<EmissionType> {
    require_non_empty("name", name)?;
    require_non_empty("unit", unit)?;
    let emission_type = store.save_emission_type(EmissionType {
        id: UNASSIGNED_ID,
        name: name.to_string(),
        unit: unit.to_string(),
        scope: scope.to_string(),
        description: description.to_string(),
    })?;
    info!(id = emission_type.id, name = %emission_type.name, "added emission type");
    Ok(emission_type)
}

// ---------------------------------------------------------------------------
// Emissions records
// ---------------------------------------------------------------------------

/// Record a measurement. A conversion rate for the measurement's type,
/// location and year must already exist so the record can be converted
/// later.
pub fn add_emission<S: EmissionsStore + ?Sized>(
    store: &mut S,
    emission_type_id: EmissionTypeId,
    location_id: LocationId,
    date: NaiveDate,
    value: f64,
) -> CarbonLedgerResult<EmissionsData> {
    if !value.is_finite() {
        return Err(CarbonLedgerError::InvalidInput {
            field: "value".into(),
            reason: format!("must be a finite number, got {value}"),
        });
    }
    let record = EmissionsData {
        id: UNASSIGNED_ID,
        date,
        value,
        emission_type_id,
        location_id,
    };
    ConversionRateResolver::new(&*store).resolve(emission_type_id, location_id, record.year())?;

    let saved = store.save_emissions_data(record)?;
    info!(id = saved.id, emission_type_id, location_id, %date, value, "added emissions record");
    Ok(saved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::upsert_conversion_rate;
    use crate::store::InMemoryStore;
    use crate::types::ConversionRateInput;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_and_get_client() {
        let mut store = InMemoryStore::new();
        let client = add_client(&mut store, "Version 1").unwrap();
        assert_eq!(get_client(&store, client.id).unwrap(), client);
        assert_eq!(all_clients(&store).len(), 1);
    }

    #[test]
    fn test_missing_entities_report_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            get_client(&store, 3),
            Err(CarbonLedgerError::EntityNotFound { entity: "Client", id: 3 })
        ));
        assert!(matches!(
            get_location(&store, 4),
            Err(CarbonLedgerError::EntityNotFound { entity: "Location", id: 4 })
        ));
        assert!(matches!(
            get_emission_type(&store, 5),
            Err(CarbonLedgerError::EntityNotFound { entity: "EmissionType", id: 5 })
        ));
    }

    #[test]
    fn test_add_location_requires_client() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            add_location(&mut store, 1, "Dublin Office", "EU"),
            Err(CarbonLedgerError::EntityNotFound { entity: "Client", .. })
        ));
        let client = add_client(&mut store, "Version 1").unwrap();
        let location = add_location(&mut store, client.id, "Dublin Office", "EU").unwrap();
        assert_eq!(locations_for_client(&store, client.id), vec![location]);
        assert_eq!(all_locations(&store).len(), 1);
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut store = InMemoryStore::new();
        assert!(add_client(&mut store, "  ").is_err());
        assert!(add_emission_type(&mut store, "Electricity", "", "Scope 2", "").is_err());
        assert!(all_emission_types(&store).is_empty());
    }

    #[test]
    fn test_add_emission_requires_rate() {
        let mut store = InMemoryStore::new();
        let client = add_client(&mut store, "Version 1").unwrap();
        let location = add_location(&mut store, client.id, "Dublin Office", "EU").unwrap();
        let electricity =
            add_emission_type(&mut store, "Electricity", "kWh", "Scope 2", "Grid power").unwrap();

        let err = add_emission(&mut store, electricity.id, location.id, date(2024, 5, 1), 10.0)
            .unwrap_err();
        assert!(matches!(err, CarbonLedgerError::ConversionRateNotFound { .. }));
        assert_eq!(store.emissions_data_count(), 0);

        upsert_conversion_rate(
            &mut store,
            &ConversionRateInput {
                rate: 0.3,
                unit: "kgCO2e/kWh".into(),
                description: String::new(),
                year: 2024,
                emission_type_id: Some(electricity.id),
                location_id: Some(location.id),
            },
        )
        .unwrap();
        let saved =
            add_emission(&mut store, electricity.id, location.id, date(2024, 5, 1), 10.0).unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(store.emissions_data_count(), 1);
    }

    #[test]
    fn test_add_emission_rejects_nan() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            add_emission(&mut store, 1, 1, date(2024, 1, 1), f64::NAN),
            Err(CarbonLedgerError::InvalidInput { .. })
        ));
    }
}
