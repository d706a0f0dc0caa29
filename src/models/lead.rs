use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lead::{
    GeoPoint, Lead as DomainLead, LeadClient as DomainLeadClient, NewLead as DomainNewLead,
    NewLeadClient as DomainNewLeadClient, UpdateLead as DomainUpdateLead,
};
use crate::domain::types::{
    ClientId, ClientName, LeadDescription, LeadId, ProtocolCode, ServiceType, TypeConstraintError,
};

/// Service type stored when the capture form did not pick any.
pub const FALLBACK_SERVICE_TYPE: &str = "outros";
/// Label used for joined clients without a name.
pub const UNKNOWN_CLIENT_NAME: &str = "Cliente Desconhecido";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Wire shape of a lead row with the nested `client` join.
pub struct LeadRow {
    pub id: String,
    #[serde(default)]
    pub protocol: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub client: Option<ClientRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
/// Insert payload for [`DomainNewLead`].
pub struct NewLeadRow<'a> {
    pub client_id: Uuid,
    pub client_name: &'a str,
    pub service_type: &'a str,
    pub description: &'a str,
    pub status: String,
    pub priority: String,
    pub origin: String,
}

#[derive(Debug, Default, Serialize)]
/// Partial update payload; unset fields are left out of the JSON body.
pub struct UpdateLeadRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
/// Arguments of the `get_or_create_client_v1` procedure.
pub struct ClientLookupArgs<'a> {
    pub p_name: &'a str,
    pub p_phone: &'a str,
    pub p_type: &'a str,
    pub p_status: &'a str,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl TryFrom<ClientRow> for DomainLeadClient {
    type Error = TypeConstraintError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let name = non_blank(row.name).unwrap_or_else(|| UNKNOWN_CLIENT_NAME.to_string());
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Ok(Self {
            id: row.id.parse::<ClientId>()?,
            name: ClientName::new(name)?,
            phone: non_blank(row.phone),
            address: non_blank(row.address),
            city: non_blank(row.city),
            neighborhood: non_blank(row.neighborhood),
            location,
        })
    }
}

impl TryFrom<LeadRow> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let protocol = row.protocol.ok_or(TypeConstraintError::InvalidProtocol)?;
        let service_type =
            non_blank(row.service_type).unwrap_or_else(|| FALLBACK_SERVICE_TYPE.to_string());
        Ok(Self {
            id: row.id.parse::<LeadId>()?,
            protocol: ProtocolCode::stored(protocol)?,
            created_at: row.created_at,
            status: row.status.unwrap_or_default().into(),
            priority: row.priority.unwrap_or_default().into(),
            service_type: ServiceType::new(service_type)?,
            description: row.description.and_then(|d| LeadDescription::new(d).ok()),
            origin: non_blank(row.origin).map(Into::into),
            client: row.client.map(DomainLeadClient::try_from).transpose()?,
        })
    }
}

impl<'a> From<&'a DomainNewLead> for NewLeadRow<'a> {
    fn from(lead: &'a DomainNewLead) -> Self {
        Self {
            client_id: lead.client_id.get(),
            client_name: lead.client_name.as_str(),
            service_type: lead.service_type.as_str(),
            description: lead.description.as_str(),
            status: lead.status.to_string(),
            priority: lead.priority.to_string(),
            origin: lead.origin.to_string(),
        }
    }
}

impl From<&DomainUpdateLead> for UpdateLeadRow {
    fn from(updates: &DomainUpdateLead) -> Self {
        Self {
            status: updates.status.as_ref().map(ToString::to_string),
            priority: updates.priority.as_ref().map(ToString::to_string),
            description: updates
                .description
                .as_ref()
                .map(|d| d.as_str().to_string()),
            assigned_team_id: updates.assigned_team_id.map(|id| id.get()),
            scheduled_for: updates.scheduled_for,
        }
    }
}

impl<'a> From<&'a DomainNewLeadClient> for ClientLookupArgs<'a> {
    fn from(client: &'a DomainNewLeadClient) -> Self {
        Self {
            p_name: client.name.as_str(),
            p_phone: client.phone.as_str(),
            p_type: "pf",
            p_status: "active",
        }
    }
}
