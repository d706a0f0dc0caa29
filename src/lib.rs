//! Data layer of the field-service lead board: filtered and paginated lead
//! queries, page-local priority ordering, live refresh from the remote change
//! feed, lead updates and the public lead capture workflow.

#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod dto;
#[cfg(feature = "client")]
pub mod error_conversions;
#[cfg(feature = "data")]
pub mod forms;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod ordering;
#[cfg(feature = "data")]
pub mod pagination;
#[cfg(feature = "client")]
pub mod repository;
#[cfg(feature = "client")]
pub mod services;

/// Environment variable selecting the `config/<env>.yaml` overlay.
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Prefix of environment variables overriding configuration keys.
pub const APP_ENV_PREFIX: &str = "APP";
