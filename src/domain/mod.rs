//! Domain aggregates exposed by the lead board service layer.

pub mod address;
pub mod filters;
pub mod lead;
pub mod types;
