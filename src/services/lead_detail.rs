//! Updates issued from the lead detail panel.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::lead::UpdateLead;
use crate::domain::types::LeadId;
use crate::dto::leads::LeadDetailState;
use crate::forms::lead_update::UpdateLeadForm;
use crate::repository::LeadWriter;

pub const EMPTY_UPDATE_MESSAGE: &str = "Nothing to update";

/// Sends lead updates and exposes the panel's loading and error flags.
pub struct LeadDetail<R: ?Sized> {
    repo: Arc<R>,
    state: watch::Sender<LeadDetailState>,
}

impl<R> LeadDetail<R>
where
    R: LeadWriter + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        let (state, _) = watch::channel(LeadDetailState::default());
        Self { repo, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<LeadDetailState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LeadDetailState {
        self.state.borrow().clone()
    }

    fn fail(&self, message: String) -> bool {
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
        false
    }

    /// Applies `updates` to the lead. Returns `false` and records the error
    /// message when the update is empty or the remote store rejects it.
    pub async fn update_lead(&self, lead_id: LeadId, updates: &UpdateLead) -> bool {
        if updates.is_empty() {
            return self.fail(EMPTY_UPDATE_MESSAGE.to_string());
        }

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.repo.update_lead(lead_id, updates).await {
            Ok(()) => {
                log::info!("Updated lead {lead_id}");
                self.state.send_modify(|state| state.loading = false);
                true
            }
            Err(e) => {
                log::error!("Error updating lead {lead_id}: {e}");
                self.fail(e.to_string())
            }
        }
    }

    /// Validates the raw panel input, then updates the lead.
    pub async fn submit(&self, lead_id: LeadId, form: UpdateLeadForm) -> bool {
        match UpdateLead::try_from(form) {
            Ok(updates) => self.update_lead(lead_id, &updates).await,
            Err(e) => {
                log::error!("Invalid update for lead {lead_id}: {e}");
                self.fail(e.to_string())
            }
        }
    }
}
