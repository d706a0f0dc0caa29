use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{
        address::Address,
        filters::LeadFilters,
        lead::{Lead, LeadOrigin, LeadPriority, LeadStatus, NewLead, NewLeadClient, UpdateLead},
        types::{Cep, ClientId, LeadId, ServiceType},
    },
    models::config::LeadsConfig,
    repository::{errors::RepositoryResult, remote::ChangeSubscription},
};

pub mod errors;
pub mod lead;
#[cfg(feature = "test-mocks")]
pub mod memory;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod realtime;
pub mod remote;
pub mod rest;
pub mod supabase;
pub mod viacep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Index of the first record of the page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.per_page)
    }
}

/// Server-side predicates and window of one lead page request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadListQuery {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub origin: Option<LeadOrigin>,
    pub service_type: Option<ServiceType>,
    pub created_since: Option<DateTime<Utc>>,
    pub pagination: Option<Pagination>,
}

impl LeadListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates board filters into predicates. The date range is resolved
    /// against `now`; the search text is not sent.
    pub fn from_filters(filters: &LeadFilters, now: DateTime<Utc>) -> Self {
        Self {
            status: filters.status.clone(),
            priority: filters.priority.clone(),
            origin: filters.origin.clone(),
            service_type: filters.service_type.clone(),
            created_since: filters.date_range.map(|range| range.lower_bound(now)),
            pagination: None,
        }
    }

    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: LeadPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn origin(mut self, origin: LeadOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = Some(service_type);
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[async_trait]
pub trait LeadReader: Send + Sync {
    /// Returns the total number of matching leads and the requested page,
    /// newest first.
    async fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
}

#[async_trait]
pub trait LeadWriter: Send + Sync {
    async fn update_lead(&self, lead_id: LeadId, updates: &UpdateLead) -> RepositoryResult<()>;
    async fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn get_or_create_client(&self, client: &NewLeadClient) -> RepositoryResult<ClientId>;
}

#[async_trait]
pub trait LeadChangeFeed: Send + Sync {
    /// Subscribes to every insert, update and delete on the leads collection.
    async fn subscribe_lead_changes(&self) -> RepositoryResult<ChangeSubscription>;
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// `Ok(None)` when the postal code is unknown.
    async fn lookup_address(&self, cep: &Cep) -> RepositoryResult<Option<Address>>;
}

/// Lead repository backed by any [`remote::RemoteDataSource`].
pub struct RemoteRepository<S: ?Sized> {
    source: Arc<S>,
    table: String,
    select: String,
    client_procedure: String,
    schema: String,
}

impl<S: ?Sized> Clone for RemoteRepository<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            table: self.table.clone(),
            select: self.select.clone(),
            client_procedure: self.client_procedure.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<S: ?Sized> RemoteRepository<S> {
    /// Repository over the default `public.orders` layout.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            table: "orders".to_string(),
            select: "*,client:clients(id,name,phone,address,city,neighborhood,latitude,longitude)"
                .to_string(),
            client_procedure: "get_or_create_client_v1".to_string(),
            schema: "public".to_string(),
        }
    }

    pub fn from_config(source: Arc<S>, config: &LeadsConfig) -> Self {
        Self {
            source,
            table: config.leads_table.clone(),
            select: config.lead_select.clone(),
            client_procedure: config.client_procedure.clone(),
            schema: config.schema.clone(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Change feed channel, `<schema>:<table>`.
    pub fn channel(&self) -> String {
        format!("{}:{}", self.schema, self.table)
    }
}
