//! Wire models exchanged with the hosted backend and configuration.

pub mod address;
pub mod config;
pub mod lead;
