use serde::Serialize;

use crate::domain::types::ProtocolCode;

/// Data shown on the confirmation screen after a lead was captured.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeadConfirmation {
    pub protocol: ProtocolCode,
    pub name: String,
    /// Comma separated list of the selected services.
    pub services: String,
    /// `URGENTE` or `Normal`.
    pub priority: String,
    pub whatsapp: String,
    pub neighborhood: String,
    pub city: String,
}
