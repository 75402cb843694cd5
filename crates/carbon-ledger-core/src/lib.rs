pub mod aggregation;
pub mod calculator;
pub mod conversion;
pub mod error;
pub mod registry;
pub mod store;
pub mod types;

#[cfg(feature = "dataset")]
pub mod dataset;

#[cfg(feature = "reports")]
pub mod reports;

pub use aggregation::EmissionsAggregator;
pub use calculator::Co2eCalculator;
pub use conversion::{upsert_conversion_rate, ConversionRateResolver};
pub use error::CarbonLedgerError;
pub use store::{EmissionsStore, InMemoryStore};
pub use types::*;

/// Standard result type for all carbon-ledger operations
pub type CarbonLedgerResult<T> = Result<T, CarbonLedgerError>;
