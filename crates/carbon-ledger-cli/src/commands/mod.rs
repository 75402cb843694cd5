pub mod emissions;
pub mod entities;
pub mod rates;
