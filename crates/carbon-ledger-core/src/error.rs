use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{EmissionTypeId, LocationId};

#[derive(Debug, Error)]
pub enum CarbonLedgerError {
    #[error("No conversion rate found for emission type {emission_type_id} at location {location_id} for year {year}")]
    ConversionRateNotFound {
        emission_type_id: EmissionTypeId,
        location_id: LocationId,
        year: i32,
    },

    #[error("Invalid conversion rate: {0}")]
    InvalidConversionRate(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("{entity} with id {id} not found")]
    EntityNotFound { entity: &'static str, id: u64 },

    #[error("Conversion rate already exists for emission type {emission_type_id} at location {location_id} for year {year}")]
    DuplicateConversionRate {
        emission_type_id: EmissionTypeId,
        location_id: LocationId,
        year: i32,
    },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CarbonLedgerError {
    pub(crate) fn not_found(entity: &'static str, id: u64) -> Self {
        CarbonLedgerError::EntityNotFound { entity, id }
    }
}

impl From<serde_json::Error> for CarbonLedgerError {
    fn from(e: serde_json::Error) -> Self {
        CarbonLedgerError::SerializationError(e.to_string())
    }
}
