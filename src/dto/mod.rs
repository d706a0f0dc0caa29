//! Data shaped for the views consuming the lead services.

pub mod lead_capture;
pub mod leads;
