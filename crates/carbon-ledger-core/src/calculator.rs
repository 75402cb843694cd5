use crate::conversion::ConversionRateResolver;
use crate::store::EmissionsStore;
use crate::types::{Co2e, ConversionRate, EmissionsData};
use crate::CarbonLedgerResult;

/// Converts a raw emissions record to CO2e.
pub struct Co2eCalculator<'a, S: EmissionsStore + ?Sized> {
    resolver: ConversionRateResolver<'a, S>,
}

impl<'a, S: EmissionsStore + ?Sized> Co2eCalculator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            resolver: ConversionRateResolver::new(store),
        }
    }

    /// `value * rate`, where the rate is the one for the record's emission
    /// type, location and calendar year. Unrounded.
    pub fn calculate(&self, data: &EmissionsData) -> CarbonLedgerResult<Co2e> {
        self.calculate_with_rate(data).map(|(co2e, _)| co2e)
    }

    /// Same as [`calculate`](Self::calculate), also returning the rate used.
    pub fn calculate_with_rate(
        &self,
        data: &EmissionsData,
    ) -> CarbonLedgerResult<(Co2e, ConversionRate)> {
        let rate = self
            .resolver
            .resolve(data.emission_type_id, data.location_id, data.year())?;
        Ok((data.value * rate.rate, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::upsert_conversion_rate;
    use crate::error::CarbonLedgerError;
    use crate::store::InMemoryStore;
    use crate::types::{Client, ConversionRateInput, EmissionType, Location, UNASSIGNED_ID};
    use chrono::NaiveDate;

    fn store_with_rate(year: i32, rate: f64) -> InMemoryStore {
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
                name: "London Office".into(),
                region: "UK".into(),
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
        upsert_conversion_rate(
            &mut store,
            &ConversionRateInput {
                rate,
                unit: "kgCO2e/kWh".into(),
                description: String::new(),
                year,
                emission_type_id: Some(1),
                location_id: Some(1),
            },
        )
        .unwrap();
        store
    }

    fn record(y: i32, m: u32, d: u32, value: f64) -> EmissionsData {
        EmissionsData {
            id: UNASSIGNED_ID,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value,
            emission_type_id: 1,
            location_id: 1,
        }
    }

    #[test]
    fn test_calculate_multiplies_value_by_rate() {
        let store = store_with_rate(2024, 0.207);
        let co2e = Co2eCalculator::new(&store)
            .calculate(&record(2024, 6, 30, 1234.5))
            .unwrap();
        assert!((co2e - 1234.5 * 0.207).abs() < 1e-9);
    }

    #[test]
    fn test_year_taken_from_record_date() {
        let store = store_with_rate(2024, 0.5);
        let calc = Co2eCalculator::new(&store);
        assert!(calc.calculate(&record(2024, 12, 31, 10.0)).is_ok());
        let err = calc.calculate(&record(2025, 1, 1, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            CarbonLedgerError::ConversionRateNotFound { year: 2025, .. }
        ));
    }

    #[test]
    fn test_calculate_with_rate_reports_rate_used() {
        let store = store_with_rate(2024, 0.25);
        let (co2e, rate) = Co2eCalculator::new(&store)
            .calculate_with_rate(&record(2024, 8, 15, 40.0))
            .unwrap();
        assert_eq!(co2e, 10.0);
        assert_eq!(rate.year, 2024);
        assert_eq!(rate.unit, "kgCO2e/kWh");
    }

    #[test]
    fn test_zero_value() {
        let store = store_with_rate(2024, 0.5);
        let co2e = Co2eCalculator::new(&store)
            .calculate(&record(2024, 3, 1, 0.0))
            .unwrap();
        assert_eq!(co2e, 0.0);
    }
}
