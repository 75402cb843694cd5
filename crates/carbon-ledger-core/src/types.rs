use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub type ClientId = u64;
pub type LocationId = u64;
pub type EmissionTypeId = u64;
pub type ConversionRateId = u64;
pub type EmissionsDataId = u64;

/// Tonnes (or kg, per the rate's unit) of CO2-equivalent.
pub type Co2e = f64;

/// Raw measured activity quantity, e.g. kWh consumed.
pub type ActivityValue = f64;

/// Identity assigned by the store on first save. `0` means "not yet saved".
pub const UNASSIGNED_ID: u64 = 0;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A tenant. Owns zero or more locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub id: ClientId,
    pub name: String,
}

/// A site belonging to exactly one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: LocationId,
    pub name: String,
    pub region: String,
    pub client_id: ClientId,
}

/// A kind of emission being tracked, e.g. "Electricity" measured in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionType {
    #[serde(default)]
    pub id: EmissionTypeId,
    pub name: String,
    pub unit: String,
    /// GHG Protocol tier: "Scope 1", "Scope 2" or "Scope 3".
    pub scope: String,
    #[serde(default)]
    pub description: String,
}

/// CO2e factor for one (emission type, location, year).
///
/// The triple `(emission_type_id, location_id, year)` is a natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRate {
    #[serde(default)]
    pub id: ConversionRateId,
    pub rate: f64,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    pub year: i32,
    pub emission_type_id: EmissionTypeId,
    pub location_id: LocationId,
}

impl ConversionRate {
    pub fn key(&self) -> RateKey {
        RateKey {
            emission_type_id: self.emission_type_id,
            location_id: self.location_id,
            year: self.year,
        }
    }
}

/// Natural key of a conversion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateKey {
    pub emission_type_id: EmissionTypeId,
    pub location_id: LocationId,
    pub year: i32,
}

/// A raw, unconverted measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsData {
    #[serde(default)]
    pub id: EmissionsDataId,
    pub date: NaiveDate,
    pub value: ActivityValue,
    pub emission_type_id: EmissionTypeId,
    pub location_id: LocationId,
}

impl EmissionsData {
    /// Year used to look up the conversion rate for this record.
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Payload for inserting or updating a conversion rate.
///
/// References are optional so that a payload missing either one can be
/// rejected explicitly rather than at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRateInput {
    pub rate: f64,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    pub year: i32,
    #[serde(default)]
    pub emission_type_id: Option<EmissionTypeId>,
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// An emissions record joined with its location and emission type, plus the
/// computed CO2e.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub id: EmissionsDataId,
    pub date: NaiveDate,
    pub value: ActivityValue,
    pub co2e: Co2e,
    pub location_id: LocationId,
    pub location_name: String,
    pub location_region: String,
    pub emission_type_id: EmissionTypeId,
    pub emission_type_name: String,
    pub unit: String,
    pub scope: String,
}

/// Per emission-type aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmissionsSummary {
    pub total_value: ActivityValue,
    pub total_co2e: Co2e,
    pub unit: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Computation envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "f64".to_string(),
        },
    }
}
