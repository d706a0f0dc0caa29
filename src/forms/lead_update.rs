use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::domain::lead::{LeadPriority, LeadStatus, UpdateLead};
use crate::domain::types::{LeadDescription, TeamId};
use crate::forms::FormError;

#[derive(Debug, Default, Deserialize, Validate)]
/// Form data submitted from the lead detail panel.
pub struct UpdateLeadForm {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Notes shown on the lead card.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_team_id: Option<String>,
    /// RFC 3339 timestamp of the scheduled visit.
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl TryFrom<UpdateLeadForm> for UpdateLead {
    type Error = FormError;

    fn try_from(form: UpdateLeadForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let status = match non_blank(form.status).map(LeadStatus::from) {
            Some(LeadStatus::Other(_)) => return Err(FormError::InvalidStatus),
            status => status,
        };
        let priority = match non_blank(form.priority).map(LeadPriority::from) {
            Some(LeadPriority::Other(_)) => return Err(FormError::InvalidPriority),
            priority => priority,
        };
        let assigned_team_id = non_blank(form.assigned_team_id)
            .map(|raw| raw.parse::<TeamId>())
            .transpose()
            .map_err(|_| FormError::InvalidTeamId)?;
        let scheduled_for = non_blank(form.scheduled_for)
            .map(|raw| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|_| FormError::InvalidDate)?;

        Ok(UpdateLead {
            status,
            priority,
            description: form.description.and_then(|d| LeadDescription::new(d).ok()),
            assigned_team_id,
            scheduled_for,
        })
    }
}
