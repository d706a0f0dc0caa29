//! Public lead capture form.

use serde::Deserialize;
use validator::Validate;

use crate::domain::lead::{LeadOrigin, LeadPriority, LeadStatus, NewLead, NewLeadClient};
use crate::domain::types::{ClientId, ClientName, LeadDescription, PhoneNumber, ServiceType};
use crate::forms::FormError;
use crate::models::lead::FALLBACK_SERVICE_TYPE;

/// Name stored for web leads that left the name blank.
pub const FALLBACK_CLIENT_NAME: &str = "Cliente Site";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LeadCaptureForm {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: String,
    #[validate(length(min = 8, max = 20))]
    pub whatsapp: String,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub uf: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Selected service keys (`portao`, `seguranca`, `manutencao`, ...).
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub other_service_description: Option<String>,
}

impl LeadCaptureForm {
    /// Emergency wins; otherwise the most pressing selected service decides.
    pub fn determine_priority(&self) -> LeadPriority {
        let selected = |key: &str| self.services.iter().any(|service| service == key);

        if self.is_emergency || selected("portao") {
            LeadPriority::Urgent
        } else if selected("seguranca") {
            LeadPriority::High
        } else {
            LeadPriority::Medium
        }
    }

    pub fn services_text(&self) -> String {
        if self.services.is_empty() {
            "Serviços não especificados".to_string()
        } else {
            self.services.join(", ")
        }
    }

    pub fn description(&self) -> String {
        let mut text = format!("Solicitação via Landing Page. Serviços: {}.", self.services_text());
        if let Some(other) = self
            .other_service_description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            text.push_str(&format!(" Obs: {other}"));
        }
        if self.is_emergency {
            text.push_str(" [EMERGÊNCIA]");
        }
        text
    }

    fn client_name(&self) -> Result<ClientName, FormError> {
        let trimmed = self.name.trim();
        let name = if trimmed.is_empty() {
            FALLBACK_CLIENT_NAME
        } else {
            trimmed
        };
        ClientName::new(name).map_err(|_| FormError::InvalidName)
    }

    /// Identity sent to the get-or-create client procedure.
    pub fn to_new_client(&self) -> Result<NewLeadClient, FormError> {
        self.validate()?;
        let phone =
            PhoneNumber::new(self.whatsapp.as_str()).map_err(|_| FormError::InvalidPhoneNumber)?;
        Ok(NewLeadClient {
            name: self.client_name()?,
            phone: phone.national_digits(),
        })
    }

    /// Lead row for the resolved client.
    pub fn to_new_lead(&self, client_id: ClientId) -> Result<NewLead, FormError> {
        let service_type = self
            .services
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_SERVICE_TYPE);

        Ok(NewLead {
            client_id,
            client_name: self.client_name()?,
            service_type: ServiceType::new(service_type)
                .map_err(|_| FormError::InvalidServiceType)?,
            description: LeadDescription::new(self.description())
                .map_err(|_| FormError::InvalidDescription)?,
            status: LeadStatus::New,
            priority: self.determine_priority(),
            origin: LeadOrigin::WebForm,
        })
    }
}
