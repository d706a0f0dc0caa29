//! Public lead capture: client resolution, lead insert and postal code lookup.

use chrono::Utc;

use crate::domain::address::Address;
use crate::domain::lead::LeadPriority;
use crate::domain::types::{Cep, ProtocolCode};
use crate::dto::lead_capture::LeadConfirmation;
use crate::forms::lead_capture::LeadCaptureForm;
use crate::repository::{AddressLookup, ClientDirectory, LeadWriter};
use crate::services::errors::ServiceResult;

/// Resolves the client, records the lead and returns what the confirmation
/// screen shows. The stored protocol is assigned by the remote store; the
/// returned one is generated locally for display.
pub async fn submit_lead<R>(repo: &R, form: &LeadCaptureForm) -> ServiceResult<LeadConfirmation>
where
    R: ClientDirectory + LeadWriter + ?Sized,
{
    let new_client = form.to_new_client()?;

    let client_id = repo
        .get_or_create_client(&new_client)
        .await
        .inspect_err(|e| log::error!("Error resolving client for lead capture: {e}"))?;

    let new_lead = form.to_new_lead(client_id)?;
    repo.create_lead(&new_lead)
        .await
        .inspect_err(|e| log::error!("Error creating lead for client {client_id}: {e}"))?;

    let protocol = ProtocolCode::generate(Utc::now());
    log::info!("Captured lead {protocol} for client {client_id}");

    Ok(LeadConfirmation {
        protocol,
        name: new_client.name.to_string(),
        services: form.services_text(),
        priority: if new_lead.priority == LeadPriority::Urgent {
            "URGENTE".to_string()
        } else {
            "Normal".to_string()
        },
        whatsapp: new_client.phone,
        neighborhood: form.neighborhood.trim().to_string(),
        city: form.city.trim().to_string(),
    })
}

/// Looks up the address of `raw_cep`. Anything other than eight digits, an
/// unknown code or a failed request yields `None`.
pub async fn lookup_address<R>(repo: &R, raw_cep: &str) -> Option<Address>
where
    R: AddressLookup + ?Sized,
{
    let cep = Cep::new(raw_cep).ok()?;

    match repo.lookup_address(&cep).await {
        Ok(address) => address,
        Err(e) => {
            log::error!("Error looking up CEP {cep}: {e}");
            None
        }
    }
}
