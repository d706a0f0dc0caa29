//! Form definitions backing the lead board and the public capture page.

use thiserror::Error;
use validator::ValidationErrors;

pub mod lead_capture;
pub mod lead_filters;
pub mod lead_update;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("malformed query string: {0}")]
    Query(String),

    #[error("invalid date range")]
    InvalidDateRange,

    #[error("invalid status")]
    InvalidStatus,

    #[error("invalid priority")]
    InvalidPriority,

    #[error("invalid team id")]
    InvalidTeamId,

    #[error("invalid date")]
    InvalidDate,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("invalid service type")]
    InvalidServiceType,

    #[error("invalid description")]
    InvalidDescription,
}
