//! Mock repository implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::address::Address;
use crate::domain::lead::{Lead, NewLead, NewLeadClient, UpdateLead};
use crate::domain::types::{Cep, ClientId, LeadId};
use crate::repository::errors::RepositoryResult;
use crate::repository::remote::ChangeSubscription;
use crate::repository::{
    AddressLookup, ClientDirectory, LeadChangeFeed, LeadListQuery, LeadReader, LeadWriter,
};

mock! {
    pub Repository {}

    #[async_trait]
    impl LeadReader for Repository {
        async fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
    }

    #[async_trait]
    impl LeadWriter for Repository {
        async fn update_lead(&self, lead_id: LeadId, updates: &UpdateLead) -> RepositoryResult<()>;
        async fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<()>;
    }

    #[async_trait]
    impl ClientDirectory for Repository {
        async fn get_or_create_client(&self, client: &NewLeadClient) -> RepositoryResult<ClientId>;
    }

    #[async_trait]
    impl LeadChangeFeed for Repository {
        async fn subscribe_lead_changes(&self) -> RepositoryResult<ChangeSubscription>;
    }

    #[async_trait]
    impl AddressLookup for Repository {
        async fn lookup_address(&self, cep: &Cep) -> RepositoryResult<Option<Address>>;
    }
}
