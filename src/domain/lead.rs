use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClientId, ClientName, LeadDescription, LeadId, ProtocolCode, ServiceType, TeamId, digits_only,
};

/// A captured service request tracked through the status pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    pub protocol: ProtocolCode,
    pub created_at: DateTime<Utc>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub service_type: ServiceType,
    pub description: Option<LeadDescription>,
    pub origin: Option<LeadOrigin>,
    pub client: Option<LeadClient>,
}

/// Customer snapshot joined onto a lead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeadClient {
    pub id: ClientId,
    pub name: ClientName,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl LeadClient {
    /// WhatsApp deep link for the client phone, `None` when no digits are known.
    pub fn whatsapp_link(&self) -> Option<String> {
        let digits = digits_only(self.phone.as_deref().unwrap_or_default());
        if digits.is_empty() {
            return None;
        }
        Some(format!("https://wa.me/55{digits}"))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    New,
    Scheduled,
    InProgress,
    Completed,
    Canceled,
    Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum LeadPriority {
    Urgent,
    High,
    Medium,
    Low,
    Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum LeadOrigin {
    WebForm,
    ManualEntry,
    Phone,
    Other(String),
}

impl LeadPriority {
    /// Rank used to order a page; unknown priorities sort with `Low`.
    pub fn rank(&self) -> u8 {
        match self {
            LeadPriority::Urgent => 3,
            LeadPriority::High => 2,
            LeadPriority::Medium => 1,
            LeadPriority::Low | LeadPriority::Other(_) => 0,
        }
    }
}

impl Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "nova"),
            LeadStatus::Scheduled => write!(f, "agendada"),
            LeadStatus::InProgress => write!(f, "em_andamento"),
            LeadStatus::Completed => write!(f, "concluida"),
            LeadStatus::Canceled => write!(f, "cancelada"),
            LeadStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for LeadStatus {
    fn from(s: &str) -> Self {
        match s {
            "nova" => LeadStatus::New,
            "agendada" => LeadStatus::Scheduled,
            "em_andamento" => LeadStatus::InProgress,
            "concluida" => LeadStatus::Completed,
            "cancelada" => LeadStatus::Canceled,
            _ => LeadStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<LeadStatus> for String {
    fn from(value: LeadStatus) -> Self {
        value.to_string()
    }
}

impl Display for LeadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadPriority::Urgent => write!(f, "urgente"),
            LeadPriority::High => write!(f, "alta"),
            LeadPriority::Medium => write!(f, "media"),
            LeadPriority::Low => write!(f, "baixa"),
            LeadPriority::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for LeadPriority {
    fn from(s: &str) -> Self {
        match s {
            "urgente" => LeadPriority::Urgent,
            "alta" => LeadPriority::High,
            "media" => LeadPriority::Medium,
            "baixa" => LeadPriority::Low,
            _ => LeadPriority::Other(s.to_string()),
        }
    }
}

impl From<String> for LeadPriority {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<LeadPriority> for String {
    fn from(value: LeadPriority) -> Self {
        value.to_string()
    }
}

impl Display for LeadOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadOrigin::WebForm => write!(f, "landing_form"),
            LeadOrigin::ManualEntry => write!(f, "admin_manual"),
            LeadOrigin::Phone => write!(f, "phone"),
            LeadOrigin::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for LeadOrigin {
    fn from(s: &str) -> Self {
        match s {
            "landing_form" => LeadOrigin::WebForm,
            "admin_manual" => LeadOrigin::ManualEntry,
            "phone" => LeadOrigin::Phone,
            _ => LeadOrigin::Other(s.to_string()),
        }
    }
}

impl From<String> for LeadOrigin {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<LeadOrigin> for String {
    fn from(value: LeadOrigin) -> Self {
        value.to_string()
    }
}

/// Lead submitted through the public capture form.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLead {
    pub client_id: ClientId,
    pub client_name: ClientName,
    pub service_type: ServiceType,
    pub description: LeadDescription,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub origin: LeadOrigin,
}

/// Partial update applied from the lead detail panel. Only `Some` fields are
/// sent to the remote store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateLead {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub description: Option<LeadDescription>,
    pub assigned_team_id: Option<TeamId>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl UpdateLead {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.description.is_none()
            && self.assigned_team_id.is_none()
            && self.scheduled_for.is_none()
    }
}

/// Customer identity handed to the get-or-create client procedure.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLeadClient {
    pub name: ClientName,
    /// Digits only, no country prefix.
    pub phone: String,
}
